//! Protocol implementations for domain checking.
//!
//! WHOIS is the primary source of truth, DNS presence is the fallback, and
//! the registry maps TLDs to the WHOIS servers that answer for them.

/// WHOIS protocol implementation
pub mod whois;

/// DNS presence probing
pub mod dns;

/// TLD to WHOIS server mappings
pub mod registry;

// Re-export commonly used functions and types
pub use dns::{DnsProber, DnsResolver, HickoryResolver, RecordKind, RecordPresence};
pub use registry::{extract_tld, get_all_known_tlds, ServerLookup, WhoisRegistry};
pub use whois::{extract_referral, TcpWhoisTransport, WhoisClient, WhoisResponse, WhoisTransport};
