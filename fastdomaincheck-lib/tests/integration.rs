// fastdomaincheck-lib/tests/integration.rs

//! Integration tests for fastdomaincheck-lib exports and end-to-end checking
//! through the public API. Network access is replaced by scripted fakes; the
//! live checks at the bottom are ignored by default.

use async_trait::async_trait;
use fastdomaincheck_lib::{
    get_all_known_tlds, AvailabilityResult, CheckConfig, CheckMethod, DomainCheckError,
    DomainChecker, DnsResolver, FileConfig, NoPacing, PacingPolicy, RecordKind, RecordPresence,
    WhoisRegistry, WhoisTransport,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// WHOIS servers keyed by hostname; unknown hosts refuse the connection.
#[derive(Default)]
struct Registries {
    responses: HashMap<&'static str, &'static str>,
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl WhoisTransport for Registries {
    async fn exchange(&self, server: &str, _query: &str) -> Result<String, DomainCheckError> {
        self.seen.lock().unwrap().push(server.to_string());
        self.responses
            .get(server)
            .map(|text| text.to_string())
            .ok_or_else(|| DomainCheckError::whois_query(server, "connection refused"))
    }
}

/// DNS zone where the listed names have an A record.
struct Zone(Vec<&'static str>);

#[async_trait]
impl DnsResolver for Zone {
    async fn lookup(
        &self,
        domain: &str,
        kind: RecordKind,
    ) -> Result<RecordPresence, DomainCheckError> {
        if kind == RecordKind::A && self.0.iter().any(|name| *name == domain) {
            Ok(RecordPresence::Found)
        } else {
            Ok(RecordPresence::Absent)
        }
    }
}

fn offline_checker(registries: Arc<Registries>, zone: Zone) -> DomainChecker {
    DomainChecker::with_config(CheckConfig::default().with_pacing(PacingPolicy::Disabled))
        .with_whois_transport(registries)
        .with_dns_resolver(Arc::new(zone))
}

#[test]
fn test_library_exports_work() {
    let all_tlds = get_all_known_tlds();
    assert!(!all_tlds.is_empty());
    assert!(all_tlds.contains(&"com".to_string()));
    assert!(all_tlds.contains(&"org".to_string()));

    let mut sorted = all_tlds.clone();
    sorted.sort();
    assert_eq!(all_tlds, sorted);
}

#[tokio::test]
async fn test_mixed_batch_end_to_end() {
    let registries = Arc::new(Registries {
        responses: HashMap::from([
            (
                "whois.verisign-grs.com",
                "   Domain Name: GOOGLE.COM\r\n   Registrar WHOIS Server: whois.markmonitor.com\r\n",
            ),
            (
                "whois.markmonitor.com",
                "Domain Name: google.com\nRegistrar: MarkMonitor, Inc.\nCreation Date: 1997-09-15\n",
            ),
            ("whois.pir.org", "NOT FOUND"),
        ]),
        seen: Mutex::new(Vec::new()),
    });
    let checker = offline_checker(registries.clone(), Zone(vec!["taken.io"]));

    let input: Vec<String> = ["google.com", "surely-free-123.org", "taken.io", "-bad-.com", "x.zz"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let results = checker.check_domains(&input).await.unwrap();

    assert_eq!(
        results,
        vec![
            AvailabilityResult::from_whois("google.com", false),
            AvailabilityResult::from_whois("surely-free-123.org", true),
            AvailabilityResult::from_dns("taken.io", false, true),
            AvailabilityResult::failed("-bad-.com", "Invalid domain format"),
            AvailabilityResult::from_dns("x.zz", true, false),
        ]
    );

    let seen = registries.seen.lock().unwrap().clone();
    assert!(seen.contains(&"whois.markmonitor.com".to_string()));
}

#[tokio::test]
async fn test_results_serialize_to_wire_format() {
    let registries = Arc::new(Registries::default());
    let checker = offline_checker(registries, Zone(vec!["busy.io"]));

    let results = checker
        .check_domains(&["busy.io".to_string(), "".to_string()])
        .await
        .unwrap();
    let json = serde_json::to_value(&results).unwrap();

    assert_eq!(
        json,
        serde_json::json!([
            {"domain": "busy.io", "available": false, "method": "dns", "fallback": true},
            {"domain": "", "available": false, "error": "Domain must be a non-empty string"}
        ])
    );
}

#[tokio::test]
async fn test_config_overlay_adds_whois_server() {
    let file: FileConfig = toml::from_str(
        r#"
[whois_servers]
zz = "whois.nic.zz"

[unregistered_patterns]
zz = ["(?i)^nope$"]
"#,
    )
    .unwrap();
    let registry = file.registry(WhoisRegistry::builtin()).unwrap();

    let registries = Arc::new(Registries {
        responses: HashMap::from([("whois.nic.zz", "nope")]),
        seen: Mutex::new(Vec::new()),
    });
    let checker = offline_checker(registries, Zone(vec![]))
        .with_registry(registry)
        .with_pacer(Arc::new(NoPacing));

    let result = checker.check_domain("anything.zz").await;
    assert_eq!(result.method, Some(CheckMethod::Whois));
    assert!(result.available);
}

#[tokio::test]
async fn test_rate_limit_text_is_never_available() {
    let registries = Arc::new(Registries {
        responses: HashMap::from([("whois.verisign-grs.com", "Error: rate limit exceeded")]),
        seen: Mutex::new(Vec::new()),
    });
    let checker = offline_checker(registries, Zone(vec![]));

    let result = checker.check_domain("maybe-free.com").await;
    assert_eq!(result, AvailabilityResult::from_whois("maybe-free.com", false));
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_known_taken_domain_google_com() {
    let checker = DomainChecker::new();
    let result = checker.check_domain("google.com").await;

    assert!(result.error.is_none(), "unexpected error: {:?}", result.error);
    assert!(!result.available);
}

#[tokio::test]
#[ignore = "requires network access"]
async fn test_unregistered_name_is_available() {
    let checker = DomainChecker::new();
    let result = checker
        .check_domain("this-domain-should-not-exist-fdc-8472.com")
        .await;

    assert_eq!(result.method, Some(CheckMethod::Whois));
    assert!(result.available);
}
