//! Main domain checker implementation.
//!
//! This module provides the `DomainChecker` struct that runs a batch of
//! domains through validation, WHOIS lookup and classification, and DNS
//! fallback, producing one result per input in input order.

use crate::classifier::{classify, Classification};
use crate::concurrent::{pacer_for, Pacer};
use crate::config::debug_whois_flag;
use crate::error::DomainCheckError;
use crate::protocols::{
    DnsProber, DnsResolver, HickoryResolver, TcpWhoisTransport, WhoisClient, WhoisRegistry,
    WhoisResponse, WhoisTransport,
};
use crate::types::{AvailabilityResult, CheckConfig};
use crate::utils::normalize_domain;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::Arc;

/// Environment variable that turns on WHOIS diagnostics.
pub const DEBUG_WHOIS_ENV: &str = "DEBUG_WHOIS";

/// Characters of each WHOIS response shown in diagnostics.
const DIAGNOSTIC_EXCERPT_CHARS: usize = 500;

/// Main domain checker that coordinates availability checking operations.
///
/// Collaborators are injectable so callers (and tests) can swap the WHOIS
/// transport, the DNS resolver, the pacing and the server table.
///
/// # Example
///
/// ```rust,no_run
/// use fastdomaincheck_lib::DomainChecker;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let checker = DomainChecker::new();
///     let results = checker
///         .check_domains(&["example.com".to_string(), "example.dev".to_string()])
///         .await?;
///     for result in results {
///         println!("{}: {}", result.domain, result.available);
///     }
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct DomainChecker {
    config: CheckConfig,
    registry: Arc<WhoisRegistry>,
    transport: Arc<dyn WhoisTransport>,
    whois_client: WhoisClient,
    dns: DnsProber,
    pacer: Arc<dyn Pacer>,
}

impl DomainChecker {
    /// Create a checker with default configuration and the built-in registry.
    pub fn new() -> Self {
        Self::with_config(CheckConfig::default())
    }

    /// Create a checker with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fastdomaincheck_lib::{CheckConfig, DomainChecker};
    /// use std::time::Duration;
    ///
    /// let config = CheckConfig::default()
    ///     .with_concurrency(3)
    ///     .with_whois_timeout(Duration::from_secs(5));
    ///
    /// let checker = DomainChecker::with_config(config);
    /// ```
    pub fn with_config(config: CheckConfig) -> Self {
        let transport: Arc<dyn WhoisTransport> =
            Arc::new(TcpWhoisTransport::with_port(config.whois_port));
        let whois_client = build_whois_client(&config, Arc::clone(&transport));
        let pacer = pacer_for(config.effective_pacing());

        Self {
            config,
            registry: WhoisRegistry::builtin(),
            transport,
            whois_client,
            dns: DnsProber::new(Arc::new(HickoryResolver::new())),
            pacer,
        }
    }

    /// Use a different WHOIS transport.
    pub fn with_whois_transport(mut self, transport: Arc<dyn WhoisTransport>) -> Self {
        self.whois_client = build_whois_client(&self.config, Arc::clone(&transport));
        self.transport = transport;
        self
    }

    /// Use a different DNS resolver for the fallback probe.
    pub fn with_dns_resolver(mut self, resolver: Arc<dyn DnsResolver>) -> Self {
        self.dns = DnsProber::new(resolver);
        self
    }

    /// Use a different pacer.
    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    /// Use a different TLD/server table.
    pub fn with_registry(mut self, registry: Arc<WhoisRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Check a single domain.
    ///
    /// Never fails: any problem is reported in the result's `error` field
    /// with `available: false`. No pacing is applied.
    pub async fn check_domain(&self, domain: &str) -> AvailabilityResult {
        match self.try_check_domain(domain).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(domain, error = %e, "domain check failed");
                AvailabilityResult::failed(domain, e.to_string())
            }
        }
    }

    async fn try_check_domain(&self, domain: &str) -> Result<AvailabilityResult, DomainCheckError> {
        let normalized = normalize_domain(domain)?;
        let lookup = self.registry.resolve(&normalized)?;

        let Some(server) = lookup.server else {
            tracing::debug!(domain, tld = %lookup.tld, "no WHOIS server for TLD, probing DNS");
            let present = self.dns.has_dns_presence(normalized.ascii()).await;
            return Ok(AvailabilityResult::from_dns(domain, !present, false));
        };

        match self.whois_client.query(normalized.ascii(), &server).await {
            Ok(response) => {
                let verdict = classify(Some(response.text.as_str()), &lookup.tld, &self.registry);
                if self.whois_diagnostics_enabled() {
                    log_whois_diagnostics(domain, &lookup.tld, &response, verdict);
                }
                tracing::debug!(domain, rule = %verdict.rule, available = verdict.available, "classified WHOIS response");
                Ok(AvailabilityResult::from_whois(domain, verdict.available))
            }
            Err(e) if e.is_whois_failure() => {
                tracing::debug!(domain, server = %server, error = %e, "WHOIS failed, falling back to DNS");
                let present = self.dns.has_dns_presence(normalized.ascii()).await;
                Ok(AvailabilityResult::from_dns(domain, !present, true))
            }
            Err(e) => Err(e),
        }
    }

    fn whois_diagnostics_enabled(&self) -> bool {
        diagnostics_enabled(
            self.config.debug_whois,
            std::env::var(DEBUG_WHOIS_ENV).ok().as_deref(),
        )
    }

    /// Check a batch of domains.
    ///
    /// Returns exactly one result per input, in input order. Sequential runs
    /// pause after every check (the last one included); concurrent runs admit
    /// checks through the shared pacer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBatch` when `domains` is empty or larger than the
    /// configured maximum. Per-domain failures are never errors.
    pub async fn check_domains(
        &self,
        domains: &[String],
    ) -> Result<Vec<AvailabilityResult>, DomainCheckError> {
        self.validate_batch(domains)?;
        Ok(self.paced_checks(domains.to_vec()).collect().await)
    }

    /// Check a batch of domains, yielding results as they complete in order.
    ///
    /// Pacing and ordering are the same as [`check_domains`](Self::check_domains).
    ///
    /// # Errors
    ///
    /// Returns `InvalidBatch` for the same batch bounds as `check_domains`.
    pub fn check_domains_stream(
        &self,
        domains: &[String],
    ) -> Result<BoxStream<'_, AvailabilityResult>, DomainCheckError> {
        self.validate_batch(domains)?;
        Ok(self.paced_checks(domains.to_vec()))
    }

    fn validate_batch(&self, domains: &[String]) -> Result<(), DomainCheckError> {
        if domains.is_empty() {
            return Err(DomainCheckError::invalid_batch(
                "domains array cannot be empty",
            ));
        }
        if domains.len() > self.config.max_batch_size {
            return Err(DomainCheckError::invalid_batch(format!(
                "Cannot check more than {} domains at once",
                self.config.max_batch_size
            )));
        }
        Ok(())
    }

    fn paced_checks(&self, domains: Vec<String>) -> BoxStream<'_, AvailabilityResult> {
        let checks = stream::iter(domains).map(move |domain| async move {
            self.pacer.before_check().await;
            let result = self.check_domain(&domain).await;
            self.pacer.after_check().await;
            result
        });

        if self.config.concurrency > 1 {
            checks.buffered(self.config.concurrency).boxed()
        } else {
            checks.then(|check| check).boxed()
        }
    }

    /// Get the current configuration for this checker.
    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// The TLD/server table in use.
    pub fn registry(&self) -> &WhoisRegistry {
        &self.registry
    }

    /// Replace the configuration, rebuilding the WHOIS client and pacer.
    ///
    /// The WHOIS transport, DNS resolver and registry are kept. A custom
    /// pacer is replaced by the one derived from the new configuration.
    pub fn set_config(&mut self, config: CheckConfig) {
        self.whois_client = build_whois_client(&config, Arc::clone(&self.transport));
        self.pacer = pacer_for(config.effective_pacing());
        self.config = config;
    }
}

impl Default for DomainChecker {
    fn default() -> Self {
        Self::new()
    }
}

fn build_whois_client(config: &CheckConfig, transport: Arc<dyn WhoisTransport>) -> WhoisClient {
    WhoisClient::with_transport(transport)
        .with_timeout(config.whois_timeout)
        .with_max_referrals(config.max_referrals)
}

/// Configured flag, or a `DEBUG_WHOIS` value that is not an explicit "off".
fn diagnostics_enabled(configured: bool, env_value: Option<&str>) -> bool {
    configured || env_value.is_some_and(debug_whois_flag)
}

fn diagnostic_excerpt(text: &str) -> String {
    text.chars().take(DIAGNOSTIC_EXCERPT_CHARS).collect()
}

fn log_whois_diagnostics(domain: &str, tld: &str, response: &WhoisResponse, verdict: Classification) {
    let excerpt = diagnostic_excerpt(&response.text);
    tracing::info!(
        domain,
        tld,
        server = %response.server,
        hops = response.hops,
        length = response.text.len(),
        available = verdict.available,
        rule = %verdict.rule,
        "WHOIS diagnostics\n{}",
        excerpt
    );
}
