//! Error handling for domain checking operations.
//!
//! This module defines the error type shared by every stage of a check,
//! from input validation through WHOIS and DNS lookups to configuration loading.

use std::fmt;
use std::time::Duration;

/// Main error type for domain checking operations.
///
/// Per-domain errors never abort a batch: the checker turns them into an
/// `AvailabilityResult` carrying the message. Only batch-level problems
/// (`InvalidBatch`) and configuration problems reach the caller as `Err`.
#[derive(Debug, Clone)]
pub enum DomainCheckError {
    /// Malformed, oversized or empty input, or no extractable TLD
    InvalidDomain { domain: String, reason: String },

    /// WHOIS query exceeded its overall time budget
    WhoisTimeout { server: String, duration: Duration },

    /// WHOIS connection or protocol failure
    WhoisQueryError { server: String, message: String },

    /// DNS resolver failure other than "no records"
    DnsResolutionError { domain: String, message: String },

    /// Batch is empty or larger than the allowed maximum
    InvalidBatch { message: String },

    /// Configuration errors (invalid settings, bad patterns, etc.)
    ConfigError { message: String },

    /// File I/O errors when reading domain lists or config files
    FileError { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl DomainCheckError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new WHOIS timeout error.
    pub fn whois_timeout<S: Into<String>>(server: S, duration: Duration) -> Self {
        Self::WhoisTimeout {
            server: server.into(),
            duration,
        }
    }

    /// Create a new WHOIS query error.
    pub fn whois_query<S: Into<String>, M: Into<String>>(server: S, message: M) -> Self {
        Self::WhoisQueryError {
            server: server.into(),
            message: message.into(),
        }
    }

    /// Create a new DNS resolution error.
    pub fn dns<D: Into<String>, M: Into<String>>(domain: D, message: M) -> Self {
        Self::DnsResolutionError {
            domain: domain.into(),
            message: message.into(),
        }
    }

    /// Create a new invalid batch error.
    pub fn invalid_batch<M: Into<String>>(message: M) -> Self {
        Self::InvalidBatch {
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether this error came from the WHOIS stage and should trigger DNS fallback.
    pub fn is_whois_failure(&self) -> bool {
        matches!(
            self,
            Self::WhoisTimeout { .. } | Self::WhoisQueryError { .. }
        )
    }
}

impl fmt::Display for DomainCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // The reason alone is what callers see in the result's `error` field.
            Self::InvalidDomain { reason, .. } => write!(f, "{}", reason),
            Self::WhoisTimeout { server, duration } => {
                write!(f, "WHOIS query timeout after {:?} ({})", duration, server)
            }
            Self::WhoisQueryError { server, message } => {
                write!(f, "WHOIS query to {} failed: {}", server, message)
            }
            Self::DnsResolutionError { domain, message } => {
                write!(f, "DNS resolution failed for '{}': {}", domain, message)
            }
            Self::InvalidBatch { message } => write!(f, "{}", message),
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for DomainCheckError {}

impl From<std::io::Error> for DomainCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}

impl From<regex::Error> for DomainCheckError {
    fn from(err: regex::Error) -> Self {
        Self::ConfigError {
            message: format!("Invalid pattern: {}", err),
        }
    }
}

impl From<toml::de::Error> for DomainCheckError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML configuration: {}", err),
        }
    }
}
