//! DNS presence probing.
//!
//! When WHOIS cannot answer, DNS is the next best signal: a name with A,
//! AAAA or NS records is almost certainly registered. The converse is weak
//! (registered domains can be parked without records), so a missing record
//! set only means "no evidence of registration".

use crate::error::DomainCheckError;
use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::sync::Arc;

/// Record types probed, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    A,
    Aaaa,
    Ns,
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordKind::A => write!(f, "A"),
            RecordKind::Aaaa => write!(f, "AAAA"),
            RecordKind::Ns => write!(f, "NS"),
        }
    }
}

/// Outcome of a single successful lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordPresence {
    /// At least one record of the requested type exists
    Found,
    /// Definitive "no records" (NXDOMAIN or NODATA)
    Absent,
}

/// Record lookups needed by the prober.
///
/// Implementations return `Err` only for failures other than a definitive
/// "no records" answer, which must be reported as `RecordPresence::Absent`.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn lookup(&self, domain: &str, kind: RecordKind)
        -> Result<RecordPresence, DomainCheckError>;
}

/// Resolver backed by `hickory-resolver`.
#[derive(Clone)]
pub struct HickoryResolver {
    resolver: TokioAsyncResolver,
}

impl HickoryResolver {
    /// Build from the system resolver configuration, or the library default
    /// configuration when the system one cannot be read.
    pub fn new() -> Self {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "system resolver configuration unavailable, using defaults");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        });
        Self::from_resolver(resolver)
    }

    /// Wrap an already configured resolver.
    pub fn from_resolver(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }
}

impl Default for HickoryResolver {
    fn default() -> Self {
        Self::new()
    }
}

fn presence<I>(domain: &str, outcome: Result<I, ResolveError>) -> Result<RecordPresence, DomainCheckError>
where
    I: IntoIterator,
{
    match outcome {
        Ok(records) => Ok(if records.into_iter().next().is_some() {
            RecordPresence::Found
        } else {
            RecordPresence::Absent
        }),
        Err(e) => match e.kind() {
            ResolveErrorKind::NoRecordsFound { .. } => Ok(RecordPresence::Absent),
            _ => Err(DomainCheckError::dns(domain, e.to_string())),
        },
    }
}

/// Absolute form of `domain`, so resolv.conf `search` suffixes are never appended.
fn fully_qualified(domain: &str) -> String {
    if domain.ends_with('.') {
        domain.to_string()
    } else {
        format!("{}.", domain)
    }
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn lookup(
        &self,
        domain: &str,
        kind: RecordKind,
    ) -> Result<RecordPresence, DomainCheckError> {
        let name = fully_qualified(domain);
        match kind {
            RecordKind::A => presence(domain, self.resolver.ipv4_lookup(name).await),
            RecordKind::Aaaa => presence(domain, self.resolver.ipv6_lookup(name).await),
            RecordKind::Ns => presence(domain, self.resolver.ns_lookup(name).await),
        }
    }
}

/// Probes a domain for any DNS presence.
#[derive(Clone)]
pub struct DnsProber {
    resolver: Arc<dyn DnsResolver>,
}

impl DnsProber {
    pub fn new(resolver: Arc<dyn DnsResolver>) -> Self {
        Self { resolver }
    }

    /// Whether `domain` (ASCII form) has A, AAAA or NS records.
    ///
    /// Each record type is only tried after the previous one was definitively
    /// absent. A resolver error at any step ends the probe with `false`.
    pub async fn has_dns_presence(&self, domain: &str) -> bool {
        for kind in [RecordKind::A, RecordKind::Aaaa, RecordKind::Ns] {
            match self.resolver.lookup(domain, kind).await {
                Ok(RecordPresence::Found) => {
                    tracing::debug!(domain, record = %kind, "DNS records found");
                    return true;
                }
                Ok(RecordPresence::Absent) => continue,
                Err(e) => {
                    tracing::debug!(domain, record = %kind, error = %e, "DNS lookup failed");
                    return false;
                }
            }
        }
        false
    }
}

impl Default for DnsProber {
    fn default() -> Self {
        Self::new(Arc::new(HickoryResolver::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Resolver answering from a table; unlisted kinds are absent.
    #[derive(Default)]
    struct TableResolver {
        answers: HashMap<RecordKind, Result<RecordPresence, DomainCheckError>>,
        asked: Mutex<Vec<RecordKind>>,
    }

    impl TableResolver {
        fn with(mut self, kind: RecordKind, answer: Result<RecordPresence, DomainCheckError>) -> Self {
            self.answers.insert(kind, answer);
            self
        }
    }

    #[async_trait]
    impl DnsResolver for TableResolver {
        async fn lookup(
            &self,
            _domain: &str,
            kind: RecordKind,
        ) -> Result<RecordPresence, DomainCheckError> {
            self.asked.lock().unwrap().push(kind);
            self.answers
                .get(&kind)
                .cloned()
                .unwrap_or(Ok(RecordPresence::Absent))
        }
    }

    async fn probe(resolver: TableResolver) -> (bool, Vec<RecordKind>) {
        let resolver = Arc::new(resolver);
        let prober = DnsProber::new(resolver.clone());
        let present = prober.has_dns_presence("example.test").await;
        let asked = resolver.asked.lock().unwrap().clone();
        (present, asked)
    }

    #[tokio::test]
    async fn test_a_record_short_circuits() {
        let (present, asked) =
            probe(TableResolver::default().with(RecordKind::A, Ok(RecordPresence::Found))).await;
        assert!(present);
        assert_eq!(asked, vec![RecordKind::A]);
    }

    #[tokio::test]
    async fn test_ns_only_domain_is_present() {
        let (present, asked) =
            probe(TableResolver::default().with(RecordKind::Ns, Ok(RecordPresence::Found))).await;
        assert!(present);
        assert_eq!(asked, vec![RecordKind::A, RecordKind::Aaaa, RecordKind::Ns]);
    }

    #[tokio::test]
    async fn test_no_records_anywhere() {
        let (present, asked) = probe(TableResolver::default()).await;
        assert!(!present);
        assert_eq!(asked.len(), 3);
    }

    #[tokio::test]
    async fn test_resolver_error_stops_probe() {
        let (present, asked) = probe(
            TableResolver::default()
                .with(RecordKind::A, Err(DomainCheckError::dns("example.test", "SERVFAIL")))
                .with(RecordKind::Ns, Ok(RecordPresence::Found)),
        )
        .await;
        assert!(!present);
        assert_eq!(asked, vec![RecordKind::A]);
    }

    #[tokio::test]
    async fn test_error_on_later_step_is_not_presence() {
        let (present, asked) = probe(
            TableResolver::default()
                .with(RecordKind::Aaaa, Err(DomainCheckError::dns("example.test", "timeout")))
                .with(RecordKind::Ns, Ok(RecordPresence::Found)),
        )
        .await;
        assert!(!present);
        assert_eq!(asked, vec![RecordKind::A, RecordKind::Aaaa]);
    }

    #[test]
    fn test_presence_from_lookup_outcome() {
        assert_eq!(
            presence("example.test", Ok::<_, ResolveError>(vec![1u8])).unwrap(),
            RecordPresence::Found
        );
        assert_eq!(
            presence("example.test", Ok::<_, ResolveError>(Vec::<u8>::new())).unwrap(),
            RecordPresence::Absent
        );

        let err = presence("example.test", Err::<Vec<u8>, _>(ResolveError::from("SERVFAIL")))
            .unwrap_err();
        assert!(matches!(err, DomainCheckError::DnsResolutionError { .. }));
    }

    #[test]
    fn test_queries_use_absolute_names() {
        assert_eq!(fully_qualified("example.com"), "example.com.");
        assert_eq!(fully_qualified("example.com."), "example.com.");
        assert_eq!(fully_qualified("xn--mnchen-3ya.de"), "xn--mnchen-3ya.de.");
    }

    #[tokio::test]
    async fn test_from_resolver_wraps_configured_resolver() {
        let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
        let prober = DnsProber::new(Arc::new(HickoryResolver::from_resolver(resolver)));
        drop(prober);
    }

    #[test]
    fn test_record_kind_display() {
        assert_eq!(RecordKind::Aaaa.to_string(), "AAAA");
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_live_lookup() {
        let prober = DnsProber::default();
        assert!(prober.has_dns_presence("google.com").await);
    }
}
