//! WHOIS protocol implementation for domain availability checking.
//!
//! A WHOIS query is a plain-text exchange over TCP port 43: the client sends
//! the domain followed by CRLF and the server answers with free-form text
//! before closing the connection. Many registries only hold a thin record and
//! point at a registrar's server for the full one, so the client follows
//! those referrals within a hop budget.

use crate::error::DomainCheckError;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Standard WHOIS port.
pub const WHOIS_PORT: u16 = 43;

/// Largest response kept from a single server.
pub const MAX_RESPONSE_BYTES: usize = 64 * 1024;

lazy_static! {
    static ref REFERRAL_LINE: Regex = Regex::new(
        r"(?im)^\s*(?:registrar whois server|whois server|referralserver|refer):[ \t]*(\S+)"
    )
    .expect("referral pattern is a valid regex");
}

/// One request/response exchange with a WHOIS server.
#[async_trait]
pub trait WhoisTransport: Send + Sync {
    /// Send `query` to `server` and return the full response text.
    async fn exchange(&self, server: &str, query: &str) -> Result<String, DomainCheckError>;
}

/// Transport speaking the WHOIS wire protocol over TCP.
#[derive(Debug, Clone)]
pub struct TcpWhoisTransport {
    port: u16,
}

impl TcpWhoisTransport {
    pub fn new() -> Self {
        Self { port: WHOIS_PORT }
    }

    pub fn with_port(port: u16) -> Self {
        Self { port }
    }
}

impl Default for TcpWhoisTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WhoisTransport for TcpWhoisTransport {
    async fn exchange(&self, server: &str, query: &str) -> Result<String, DomainCheckError> {
        let mut stream = TcpStream::connect((server, self.port))
            .await
            .map_err(|e| DomainCheckError::whois_query(server, e.to_string()))?;

        stream
            .write_all(format!("{}\r\n", query).as_bytes())
            .await
            .map_err(|e| DomainCheckError::whois_query(server, e.to_string()))?;

        let mut body = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let read = stream
                .read(&mut chunk)
                .await
                .map_err(|e| DomainCheckError::whois_query(server, e.to_string()))?;
            if read == 0 {
                break;
            }
            let room = MAX_RESPONSE_BYTES - body.len();
            body.extend_from_slice(&chunk[..read.min(room)]);
            if body.len() >= MAX_RESPONSE_BYTES {
                break;
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Text returned by the last server in a referral chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoisResponse {
    /// Server that produced `text`
    pub server: String,
    /// Raw response text
    pub text: String,
    /// Number of referrals followed to get here
    pub hops: usize,
}

/// WHOIS client with a time budget and referral following.
#[derive(Clone)]
pub struct WhoisClient {
    transport: Arc<dyn WhoisTransport>,
    timeout: Duration,
    max_referrals: usize,
}

impl WhoisClient {
    /// Create a client speaking TCP on port 43 with a 10 second budget.
    pub fn new() -> Self {
        Self::with_transport(Arc::new(TcpWhoisTransport::new()))
    }

    /// Create a client over a custom transport.
    pub fn with_transport(transport: Arc<dyn WhoisTransport>) -> Self {
        Self {
            transport,
            timeout: crate::types::DEFAULT_WHOIS_TIMEOUT,
            max_referrals: 5,
        }
    }

    /// Set the overall time budget, referral hops included.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of referrals followed.
    pub fn with_max_referrals(mut self, hops: usize) -> Self {
        self.max_referrals = hops;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Query `server` for `domain` (ASCII form) and follow referrals.
    ///
    /// # Errors
    ///
    /// Returns `WhoisTimeout` when the whole chain exceeds the time budget and
    /// `WhoisQueryError` when the first server cannot be queried. A failing
    /// referral hop is not an error: the previous response is returned.
    pub async fn query(&self, domain: &str, server: &str) -> Result<WhoisResponse, DomainCheckError> {
        match tokio::time::timeout(self.timeout, self.follow_referrals(domain, server)).await {
            Ok(result) => result,
            Err(_) => Err(DomainCheckError::whois_timeout(server, self.timeout)),
        }
    }

    async fn follow_referrals(
        &self,
        domain: &str,
        server: &str,
    ) -> Result<WhoisResponse, DomainCheckError> {
        let text = self.transport.exchange(server, domain).await?;
        let mut current = WhoisResponse {
            server: server.to_lowercase(),
            text,
            hops: 0,
        };
        let mut visited = vec![current.server.clone()];

        while current.hops < self.max_referrals {
            let next = match extract_referral(&current.text) {
                Some(next) if !visited.contains(&next) => next,
                _ => break,
            };

            tracing::debug!(domain, from = %current.server, to = %next, "following WHOIS referral");

            match self.transport.exchange(&next, domain).await {
                Ok(text) => {
                    visited.push(next.clone());
                    current = WhoisResponse {
                        server: next,
                        text,
                        hops: current.hops + 1,
                    };
                }
                Err(e) => {
                    tracing::debug!(domain, server = %next, error = %e, "referral failed, keeping previous response");
                    break;
                }
            }
        }

        Ok(current)
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the referral target named in a WHOIS response.
///
/// Recognizes `Registrar WHOIS Server:`, `Whois Server:`, `ReferralServer:`
/// and `refer:` lines. Any `whois://` or `rwhois://` scheme and `:port`
/// suffix is dropped.
pub fn extract_referral(text: &str) -> Option<String> {
    REFERRAL_LINE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| clean_server_name(m.as_str()))
        .find(|server| !server.is_empty())
}

fn clean_server_name(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("rwhois://")
        .or_else(|| lower.strip_prefix("whois://"))
        .unwrap_or(&lower);
    let host = without_scheme.split(['/', ':']).next().unwrap_or("");
    host.trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Reply {
        Text(&'static str),
        Fail,
        Hang,
    }

    /// Transport answering from a fixed table and recording every call.
    struct ScriptedTransport {
        replies: HashMap<&'static str, Reply>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<(&'static str, Reply)>) -> Arc<Self> {
            Arc::new(Self {
                replies: replies.into_iter().collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WhoisTransport for ScriptedTransport {
        async fn exchange(&self, server: &str, _query: &str) -> Result<String, DomainCheckError> {
            self.calls.lock().unwrap().push(server.to_string());
            match self.replies.get(server) {
                Some(Reply::Text(text)) => Ok(text.to_string()),
                Some(Reply::Hang) => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(String::new())
                }
                Some(Reply::Fail) | None => {
                    Err(DomainCheckError::whois_query(server, "connection refused"))
                }
            }
        }
    }

    #[test]
    fn test_extract_referral_variants() {
        assert_eq!(
            extract_referral("Domain Name: X\n   Registrar WHOIS Server: whois.markmonitor.com\n"),
            Some("whois.markmonitor.com".to_string())
        );
        assert_eq!(
            extract_referral("refer:        whois.verisign-grs.com\n"),
            Some("whois.verisign-grs.com".to_string())
        );
        assert_eq!(
            extract_referral("ReferralServer: rwhois://rwhois.example.net:4321\n"),
            Some("rwhois.example.net".to_string())
        );
        assert_eq!(
            extract_referral("Whois Server: whois://WHOIS.Example.COM/\n"),
            Some("whois.example.com".to_string())
        );
        assert_eq!(extract_referral("No match for \"X.COM\"."), None);
        assert_eq!(extract_referral("Registrar WHOIS Server:\nRegistrar: X"), None);
    }

    #[tokio::test]
    async fn test_single_query_without_referral() {
        let transport = ScriptedTransport::new(vec![("whois.nic.io", Reply::Text("NOT FOUND"))]);
        let client = WhoisClient::with_transport(transport.clone());

        let response = client.query("example.io", "whois.nic.io").await.unwrap();
        assert_eq!(response.text, "NOT FOUND");
        assert_eq!(response.server, "whois.nic.io");
        assert_eq!(response.hops, 0);
        assert_eq!(transport.calls(), vec!["whois.nic.io"]);
    }

    #[tokio::test]
    async fn test_referral_is_followed() {
        let transport = ScriptedTransport::new(vec![
            (
                "whois.verisign-grs.com",
                Reply::Text("Domain Name: EXAMPLE.COM\nRegistrar WHOIS Server: whois.registrar.test\n"),
            ),
            ("whois.registrar.test", Reply::Text("Domain Name: example.com\nRegistrant: Someone\n")),
        ]);
        let client = WhoisClient::with_transport(transport.clone());

        let response = client
            .query("example.com", "whois.verisign-grs.com")
            .await
            .unwrap();
        assert_eq!(response.server, "whois.registrar.test");
        assert!(response.text.contains("Registrant"));
        assert_eq!(response.hops, 1);
    }

    #[tokio::test]
    async fn test_self_referral_ends_chain() {
        let transport = ScriptedTransport::new(vec![(
            "whois.verisign-grs.com",
            Reply::Text("Registrar WHOIS Server: whois.verisign-grs.com\n"),
        )]);
        let client = WhoisClient::with_transport(transport.clone());

        client
            .query("example.com", "whois.verisign-grs.com")
            .await
            .unwrap();
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_referral_loop_stops_at_visited_server() {
        let transport = ScriptedTransport::new(vec![
            ("a.test", Reply::Text("Whois Server: b.test")),
            ("b.test", Reply::Text("Whois Server: a.test")),
        ]);
        let client = WhoisClient::with_transport(transport.clone());

        let response = client.query("x.com", "a.test").await.unwrap();
        assert_eq!(response.server, "b.test");
        assert_eq!(transport.calls(), vec!["a.test", "b.test"]);
    }

    #[tokio::test]
    async fn test_hop_budget_returns_last_response() {
        let transport = ScriptedTransport::new(vec![
            ("h0.test", Reply::Text("refer: h1.test")),
            ("h1.test", Reply::Text("refer: h2.test")),
            ("h2.test", Reply::Text("refer: h3.test")),
            ("h3.test", Reply::Text("refer: h4.test")),
        ]);
        let client = WhoisClient::with_transport(transport.clone()).with_max_referrals(2);

        let response = client.query("x.com", "h0.test").await.unwrap();
        assert_eq!(response.server, "h2.test");
        assert_eq!(response.text, "refer: h3.test");
        assert_eq!(response.hops, 2);
        assert_eq!(transport.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_failed_referral_keeps_previous_response() {
        let transport = ScriptedTransport::new(vec![
            ("whois.nic.test", Reply::Text("Domain Name: X.TEST\nWhois Server: down.test\n")),
            ("down.test", Reply::Fail),
        ]);
        let client = WhoisClient::with_transport(transport.clone());

        let response = client.query("x.test", "whois.nic.test").await.unwrap();
        assert_eq!(response.server, "whois.nic.test");
        assert!(response.text.starts_with("Domain Name"));
    }

    #[tokio::test]
    async fn test_first_query_failure_is_surfaced() {
        let transport = ScriptedTransport::new(vec![("whois.nic.test", Reply::Fail)]);
        let client = WhoisClient::with_transport(transport);

        let err = client.query("x.test", "whois.nic.test").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::WhoisQueryError { .. }));
        assert!(err.is_whois_failure());
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_budget_covers_whole_chain() {
        let transport = ScriptedTransport::new(vec![
            ("fast.test", Reply::Text("refer: slow.test")),
            ("slow.test", Reply::Hang),
        ]);
        let client = WhoisClient::with_transport(transport).with_timeout(Duration::from_secs(10));

        let started = tokio::time::Instant::now();
        let err = client.query("x.test", "fast.test").await.unwrap_err();
        assert!(matches!(err, DomainCheckError::WhoisTimeout { .. }));
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(10) && elapsed < Duration::from_secs(11));
    }

    #[test]
    fn test_defaults() {
        let client = WhoisClient::new();
        assert_eq!(client.timeout(), Duration::from_secs(10));
        assert_eq!(client.max_referrals, 5);
    }
}
