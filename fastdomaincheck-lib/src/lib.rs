//! # FastDomainCheck Library
//!
//! Bulk domain availability checking over WHOIS, with DNS presence as the
//! fallback when WHOIS cannot answer.
//!
//! WHOIS responses are free-form text, so availability is decided by a
//! conservative classifier: anything ambiguous is reported as registered.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fastdomaincheck_lib::DomainChecker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let checker = DomainChecker::new();
//!     let result = checker.check_domain("example.com").await;
//!
//!     println!("Domain: {} - Available: {}", result.domain, result.available);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **WHOIS with referrals**: follows registrar referrals within a time budget
//! - **DNS fallback**: A/AAAA/NS presence when WHOIS fails or no server is known
//! - **IDN support**: internationalized names are queried in ASCII form
//! - **Pacing**: fixed delay or token bucket to stay under registry rate limits
//! - **Configurable**: TOML files, environment variables, extra WHOIS servers

// Re-export main public API types and functions
// This makes them available as fastdomaincheck_lib::TypeName
pub use checker::{DomainChecker, DEBUG_WHOIS_ENV};
pub use classifier::{classify, is_unregistered, Classification, ClassificationRule};
pub use concurrent::{pacer_for, FixedDelayPacer, NoPacing, Pacer, TokenBucketPacer};
pub use config::{
    load_env_config, parse_timeout_string, ConfigManager, DefaultsConfig, EnvConfig, FileConfig,
};
pub use error::DomainCheckError;
pub use protocols::{
    extract_referral, extract_tld, get_all_known_tlds, DnsProber, DnsResolver, HickoryResolver,
    RecordKind, RecordPresence, ServerLookup, TcpWhoisTransport, WhoisClient, WhoisRegistry,
    WhoisResponse, WhoisTransport,
};
pub use types::{
    AvailabilityResult, CheckConfig, CheckMethod, PacingPolicy, DEFAULT_PACING_DELAY,
    DEFAULT_WHOIS_TIMEOUT, MAX_BATCH_SIZE,
};
pub use utils::{normalize_domain, NormalizedDomain};

// Internal modules - these are not part of the public API
mod checker;
mod classifier;
mod concurrent;
mod config;
mod error;
mod protocols;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainCheckError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
