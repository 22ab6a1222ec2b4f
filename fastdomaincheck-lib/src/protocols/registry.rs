//! WHOIS server lookup table and TLD resolution.
//!
//! This module owns the static mapping from top-level domains to their
//! authoritative WHOIS servers, plus the registry-specific phrases some
//! registries use to say "not found". The table is built once and never
//! mutated; overlays from config files produce a new registry.

use crate::error::DomainCheckError;
use crate::utils::{label_to_ascii, NormalizedDomain};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Built-in TLD -> WHOIS server mappings, keyed by ASCII-compatible TLD.
const WHOIS_SERVERS: &[(&str, &str)] = &[
    // Legacy gTLDs
    ("com", "whois.verisign-grs.com"),
    ("net", "whois.verisign-grs.com"),
    ("org", "whois.pir.org"),
    ("info", "whois.nic.info"),
    ("biz", "whois.nic.biz"),
    ("name", "whois.nic.name"),
    ("pro", "whois.nic.pro"),
    ("mobi", "whois.nic.mobi"),
    ("asia", "whois.nic.asia"),
    ("edu", "whois.educause.edu"),
    ("gov", "whois.dotgov.gov"),
    // Google registry
    ("app", "whois.nic.google"),
    ("dev", "whois.nic.google"),
    ("page", "whois.nic.google"),
    // Newer gTLDs
    ("xyz", "whois.nic.xyz"),
    ("tech", "whois.nic.tech"),
    ("online", "whois.nic.online"),
    ("site", "whois.nic.site"),
    ("store", "whois.nic.store"),
    ("shop", "whois.nic.shop"),
    ("club", "whois.nic.club"),
    ("top", "whois.nic.top"),
    ("blog", "whois.nic.blog"),
    ("cloud", "whois.nic.cloud"),
    ("design", "whois.nic.design"),
    ("live", "whois.nic.live"),
    // ccTLDs commonly used as generics
    ("io", "whois.nic.io"),
    ("ai", "whois.nic.ai"),
    ("co", "whois.nic.co"),
    ("me", "whois.nic.me"),
    ("tv", "whois.nic.tv"),
    ("cc", "ccwhois.verisign-grs.com"),
    ("sh", "whois.nic.sh"),
    ("ly", "whois.nic.ly"),
    ("gg", "whois.gg"),
    ("la", "whois.nic.la"),
    ("fm", "whois.nic.fm"),
    ("vc", "whois.nic.vc"),
    ("ws", "whois.website.ws"),
    // Country code TLDs
    ("us", "whois.nic.us"),
    ("uk", "whois.nic.uk"),
    ("de", "whois.denic.de"),
    ("fr", "whois.nic.fr"),
    ("nl", "whois.domain-registry.nl"),
    ("eu", "whois.eu"),
    ("it", "whois.nic.it"),
    ("es", "whois.nic.es"),
    ("jp", "whois.jprs.jp"),
    ("cn", "whois.cnnic.cn"),
    ("ru", "whois.tcinet.ru"),
    ("br", "whois.registro.br"),
    ("in", "whois.registry.in"),
    ("au", "whois.auda.org.au"),
    ("ca", "whois.cira.ca"),
    ("ch", "whois.nic.ch"),
    ("li", "whois.nic.li"),
    ("at", "whois.nic.at"),
    ("be", "whois.dns.be"),
    ("se", "whois.iis.se"),
    ("nu", "whois.iis.nu"),
    ("no", "whois.norid.no"),
    ("dk", "whois.punktum.dk"),
    ("fi", "whois.fi"),
    ("pl", "whois.dns.pl"),
    ("pt", "whois.dns.pt"),
    ("kr", "whois.kr"),
    ("tw", "whois.twnic.net.tw"),
    ("hk", "whois.hkirc.hk"),
    ("sg", "whois.sgnic.sg"),
    ("nz", "whois.irs.net.nz"),
    ("mx", "whois.mx"),
    // Internationalized TLDs
    ("xn--fiqs8s", "cwhois.cnnic.cn"),  // .中国
    ("xn--55qx5d", "whois.ngtld.cn"),   // .公司
    ("xn--io0a7i", "whois.ngtld.cn"),   // .网络
    ("xn--p1ai", "whois.tcinet.ru"),    // .рф
];

/// Registry-specific "not registered" phrases, tried after the generic ones.
const UNREGISTERED_PATTERNS: &[(&str, &[&str])] = &[
    ("uk", &[r"(?im)^\s*no match for", r"(?i)this domain name has not been registered"]),
    ("de", &[r"(?im)^\s*status:\s*free"]),
    ("jp", &[r"(?i)no match!!"]),
    ("fr", &[r"(?im)^%%\s*no entries found"]),
    ("nl", &[r"(?i)\bis free\b"]),
    ("eu", &[r"(?im)^\s*status:\s*available"]),
    ("be", &[r"(?im)^\s*status:\s*available"]),
    ("it", &[r"(?im)^\s*status:\s*available"]),
    ("cn", &[r"(?i)no matching record"]),
    ("xn--fiqs8s", &[r"(?i)no matching record"]),
    ("au", &[r"(?im)^\s*no data found"]),
    ("se", &[r"(?im)^domain \S+ not found"]),
    ("nu", &[r"(?im)^domain \S+ not found"]),
    ("no", &[r"(?im)^% no match"]),
    ("dk", &[r"(?i)no entries found for the selected source"]),
    ("ru", &[r"(?i)no entries found for the selected source"]),
    ("xn--p1ai", &[r"(?i)no entries found for the selected source"]),
    ("br", &[r"(?im)^% no match for"]),
    ("kr", &[r"(?i)the requested domain was not found"]),
    ("pl", &[r"(?i)no information available about domain name"]),
    ("ch", &[r"(?i)we do not have an entry in our database"]),
    ("li", &[r"(?i)we do not have an entry in our database"]),
    ("at", &[r"(?im)^%\s*nothing found"]),
    ("tw", &[r"(?i)no found"]),
    ("mx", &[r"(?i)object_not_found"]),
    ("io", &[r"(?im)^\s*domain not found"]),
    ("ai", &[r"(?im)^\s*domain not found"]),
    ("sh", &[r"(?im)^\s*domain not found"]),
];

lazy_static! {
    static ref BUILTIN_REGISTRY: Arc<WhoisRegistry> = Arc::new(
        WhoisRegistry::from_tables(WHOIS_SERVERS, UNREGISTERED_PATTERNS)
            .expect("built-in WHOIS tables are valid"),
    );
}

/// Immutable TLD -> WHOIS server table with per-registry "not found" patterns.
#[derive(Debug, Clone, Default)]
pub struct WhoisRegistry {
    servers: HashMap<String, String>,
    patterns: HashMap<String, Vec<Regex>>,
}

/// Outcome of resolving a domain against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerLookup {
    /// The TLD in the form it appears in the normalized domain
    pub tld: String,
    /// The WHOIS server, or `None` when the table has no entry for the TLD
    pub server: Option<String>,
}

impl WhoisRegistry {
    /// The shared built-in registry.
    pub fn builtin() -> Arc<WhoisRegistry> {
        Arc::clone(&BUILTIN_REGISTRY)
    }

    /// Build a registry from static tables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any pattern fails to compile.
    pub fn from_tables(
        servers: &[(&str, &str)],
        patterns: &[(&str, &[&str])],
    ) -> Result<Self, DomainCheckError> {
        let mut registry = Self::default();
        for (tld, server) in servers {
            registry.insert_server(tld, server)?;
        }
        for (tld, tld_patterns) in patterns {
            for pattern in tld_patterns.iter() {
                registry.insert_pattern(tld, pattern)?;
            }
        }
        Ok(registry)
    }

    /// Return a copy of this registry with extra or overriding entries.
    ///
    /// Servers in the overlay replace existing ones; patterns are appended
    /// after the existing patterns for the same TLD.
    pub fn with_overlay(
        &self,
        servers: &HashMap<String, String>,
        patterns: &HashMap<String, Vec<String>>,
    ) -> Result<Self, DomainCheckError> {
        let mut registry = self.clone();
        for (tld, server) in servers {
            registry.insert_server(tld, server)?;
        }
        for (tld, tld_patterns) in patterns {
            for pattern in tld_patterns {
                registry.insert_pattern(tld, pattern)?;
            }
        }
        Ok(registry)
    }

    fn insert_server(&mut self, tld: &str, server: &str) -> Result<(), DomainCheckError> {
        let key = table_key(tld)?;
        let server = server.trim();
        if server.is_empty() {
            return Err(DomainCheckError::config(format!(
                "WHOIS server for TLD '{}' cannot be empty",
                tld
            )));
        }
        self.servers.insert(key, server.to_lowercase());
        Ok(())
    }

    fn insert_pattern(&mut self, tld: &str, pattern: &str) -> Result<(), DomainCheckError> {
        let key = table_key(tld)?;
        let regex = Regex::new(pattern)?;
        self.patterns.entry(key).or_default().push(regex);
        Ok(())
    }

    /// Look up the WHOIS server for a TLD.
    ///
    /// The ASCII-compatible form is tried first, then the TLD as given, so
    /// both `中国` and `xn--fiqs8s` find the same entry.
    pub fn server_for(&self, tld: &str) -> Option<&str> {
        let tld = tld.to_lowercase();
        self.servers
            .get(&label_to_ascii(&tld))
            .or_else(|| self.servers.get(&tld))
            .map(String::as_str)
    }

    /// Registry-specific unregistered patterns for a TLD (possibly empty).
    pub fn unregistered_patterns(&self, tld: &str) -> &[Regex] {
        let tld = tld.to_lowercase();
        self.patterns
            .get(&label_to_ascii(&tld))
            .or_else(|| self.patterns.get(&tld))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolve a normalized domain to its TLD and WHOIS server.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDomain` when the name has no TLD (a single label).
    pub fn resolve(&self, domain: &NormalizedDomain) -> Result<ServerLookup, DomainCheckError> {
        let tld = extract_tld(domain.as_str())?;
        let server = self.server_for(&tld).map(str::to_string);
        Ok(ServerLookup { tld, server })
    }

    /// All TLDs with a configured WHOIS server, sorted.
    pub fn known_tlds(&self) -> Vec<String> {
        let mut tlds: Vec<String> = self.servers.keys().cloned().collect();
        tlds.sort();
        tlds
    }

    /// Number of TLDs with a configured WHOIS server.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Whether the registry has no servers at all.
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

fn table_key(tld: &str) -> Result<String, DomainCheckError> {
    let tld = tld.trim().trim_start_matches('.').to_lowercase();
    if tld.is_empty() || tld.contains('.') || tld.contains(char::is_whitespace) {
        return Err(DomainCheckError::config(format!("Invalid TLD '{}'", tld)));
    }
    Ok(label_to_ascii(&tld))
}

/// Extract the TLD (the last label) from a domain name.
///
/// Multi-level public suffixes are not special-cased: `example.co.uk`
/// resolves to `uk`, whose registry answers for the whole tree.
pub fn extract_tld(domain: &str) -> Result<String, DomainCheckError> {
    let parts: Vec<&str> = domain.split('.').collect();

    match parts.as_slice() {
        [.., _, last] if !last.is_empty() => Ok(last.to_lowercase()),
        _ => Err(DomainCheckError::invalid_domain(domain, "Invalid domain format")),
    }
}

/// Get all TLDs with a built-in WHOIS server, sorted alphabetically.
pub fn get_all_known_tlds() -> Vec<String> {
    BUILTIN_REGISTRY.known_tlds()
}
