//! Core data types for domain availability checking.
//!
//! This module defines the result record returned for every checked domain
//! and the configuration knobs that shape a batch run.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Result of a domain availability check.
///
/// Exactly one of these is produced per input domain, in input order.
/// Optional fields are omitted from JSON output when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityResult {
    /// The domain exactly as the caller supplied it
    pub domain: String,

    /// Whether the domain appears to be available for registration.
    /// Defaults to `false` whenever the check failed.
    pub available: bool,

    /// Which method produced the answer (absent when validation failed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<CheckMethod>,

    /// Set to `true` only when DNS was used because WHOIS failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,

    /// Error message if the check could not be completed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AvailabilityResult {
    /// Result decided by classifying a WHOIS response.
    pub fn from_whois<D: Into<String>>(domain: D, available: bool) -> Self {
        Self {
            domain: domain.into(),
            available,
            method: Some(CheckMethod::Whois),
            fallback: None,
            error: None,
        }
    }

    /// Result decided by DNS presence. `fallback` marks a WHOIS failure.
    pub fn from_dns<D: Into<String>>(domain: D, available: bool, fallback: bool) -> Self {
        Self {
            domain: domain.into(),
            available,
            method: Some(CheckMethod::Dns),
            fallback: fallback.then_some(true),
            error: None,
        }
    }

    /// Result for a domain whose check failed before any method answered.
    pub fn failed<D: Into<String>, E: Into<String>>(domain: D, error: E) -> Self {
        Self {
            domain: domain.into(),
            available: false,
            method: None,
            fallback: None,
            error: Some(error.into()),
        }
    }

    /// Whether DNS fallback was used after a WHOIS failure.
    pub fn used_fallback(&self) -> bool {
        self.fallback.unwrap_or(false)
    }
}

/// Method used to check domain availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckMethod {
    /// Answer derived from a WHOIS response
    #[serde(rename = "whois")]
    Whois,

    /// Answer derived from DNS record presence
    #[serde(rename = "dns")]
    Dns,
}

/// How checks are spaced out to stay under WHOIS rate limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacingPolicy {
    /// Sleep for the given duration after every completed check
    FixedDelay(Duration),

    /// Admit at most one check per period, shared across concurrent checks
    TokenBucket(Duration),

    /// No pacing at all (tests and offline tooling)
    Disabled,
}

/// Configuration options for domain checking operations.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    /// Overall budget for one WHOIS query, referral hops included.
    /// Default: 10 seconds
    pub whois_timeout: Duration,

    /// Maximum number of registrar referrals to follow. Default: 5
    pub max_referrals: usize,

    /// TCP port for WHOIS servers. Default: 43
    pub whois_port: u16,

    /// Pacing between checks. Default: fixed 300 ms delay
    pub pacing: PacingPolicy,

    /// Number of domains checked at once. Default: 1 (sequential)
    pub concurrency: usize,

    /// Largest batch accepted by `check_domains`. Default: 50
    pub max_batch_size: usize,

    /// Emit WHOIS diagnostics (server, length, excerpt) for every query
    pub debug_whois: bool,
}

/// Default pause inserted after each check.
pub const DEFAULT_PACING_DELAY: Duration = Duration::from_millis(300);

/// Default overall WHOIS time budget.
pub const DEFAULT_WHOIS_TIMEOUT: Duration = Duration::from_secs(10);

/// Default ceiling on batch size.
pub const MAX_BATCH_SIZE: usize = 50;

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            whois_timeout: DEFAULT_WHOIS_TIMEOUT,
            max_referrals: 5,
            whois_port: 43,
            pacing: PacingPolicy::FixedDelay(DEFAULT_PACING_DELAY),
            concurrency: 1,
            max_batch_size: MAX_BATCH_SIZE,
            debug_whois: false,
        }
    }
}

impl CheckConfig {
    /// Set the number of domains checked at once.
    ///
    /// Capped at 10: WHOIS servers throttle aggressively and the aggregate
    /// pacing makes higher values pointless.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, 10);
        self
    }

    /// Set the overall WHOIS time budget.
    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    /// Set the referral hop budget.
    pub fn with_max_referrals(mut self, hops: usize) -> Self {
        self.max_referrals = hops;
        self
    }

    /// Set the pacing policy.
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    /// Enable or disable WHOIS diagnostics.
    pub fn with_debug_whois(mut self, enabled: bool) -> Self {
        self.debug_whois = enabled;
        self
    }

    /// The pacing actually applied.
    ///
    /// A fixed delay only makes sense for single-flight runs; with concurrency
    /// above one it becomes a token bucket with the same period so the
    /// aggregate request rate does not change.
    pub fn effective_pacing(&self) -> PacingPolicy {
        match self.pacing {
            PacingPolicy::FixedDelay(delay) if self.concurrency > 1 => {
                PacingPolicy::TokenBucket(delay)
            }
            other => other,
        }
    }
}

impl std::fmt::Display for CheckMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckMethod::Whois => write!(f, "WHOIS"),
            CheckMethod::Dns => write!(f, "DNS"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whois_result_serialization_omits_absent_fields() {
        let result = AvailabilityResult::from_whois("example.com", false);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"domain": "example.com", "available": false, "method": "whois"})
        );
    }

    #[test]
    fn test_dns_fallback_result_serialization() {
        let result = AvailabilityResult::from_dns("example.io", false, true);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["method"], "dns");
        assert_eq!(json["fallback"], true);
        assert!(json.get("error").is_none());

        let direct = AvailabilityResult::from_dns("example.zz", true, false);
        let json = serde_json::to_value(&direct).unwrap();
        assert!(json.get("fallback").is_none());
    }

    #[test]
    fn test_failed_result_has_no_method() {
        let result = AvailabilityResult::failed("-bad-.com", "Invalid domain format");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "domain": "-bad-.com",
                "available": false,
                "error": "Invalid domain format"
            })
        );
    }

    #[test]
    fn test_default_config() {
        let config = CheckConfig::default();
        assert_eq!(config.whois_timeout, Duration::from_secs(10));
        assert_eq!(config.max_referrals, 5);
        assert_eq!(
            config.pacing,
            PacingPolicy::FixedDelay(Duration::from_millis(300))
        );
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_batch_size, 50);
        assert!(!config.debug_whois);
    }

    #[test]
    fn test_effective_pacing_switches_to_token_bucket() {
        let sequential = CheckConfig::default();
        assert_eq!(sequential.effective_pacing(), sequential.pacing);

        let concurrent = CheckConfig::default().with_concurrency(4);
        assert_eq!(
            concurrent.effective_pacing(),
            PacingPolicy::TokenBucket(DEFAULT_PACING_DELAY)
        );

        let disabled = CheckConfig::default()
            .with_concurrency(4)
            .with_pacing(PacingPolicy::Disabled);
        assert_eq!(disabled.effective_pacing(), PacingPolicy::Disabled);
    }

    #[test]
    fn test_concurrency_is_clamped() {
        assert_eq!(CheckConfig::default().with_concurrency(0).concurrency, 1);
        assert_eq!(CheckConfig::default().with_concurrency(500).concurrency, 10);
    }
}
