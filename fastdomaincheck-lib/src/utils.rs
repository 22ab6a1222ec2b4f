//! Domain name normalization and validation.
//!
//! Every raw input goes through [`normalize_domain`] before any lookup.
//! The result carries both the lowercased Unicode form and the
//! ASCII-compatible (punycode) form used on the wire.

use crate::error::DomainCheckError;
use lazy_static::lazy_static;
use regex::Regex;

/// Shortest accepted domain, in characters.
pub const MIN_DOMAIN_LENGTH: usize = 1;

/// Longest accepted domain, in characters.
pub const MAX_DOMAIN_LENGTH: usize = 253;

lazy_static! {
    /// Labels of 1-63 chars, alphanumeric at both ends, hyphens inside.
    static ref LABEL_SEQUENCE: Regex = Regex::new(
        r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?(\.[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?)*$"
    )
    .expect("label grammar is a valid regex");
}

/// A trimmed, lowercased and validated domain name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedDomain {
    name: String,
    ascii: String,
}

impl NormalizedDomain {
    /// The normalized name as the user wrote it (may contain Unicode).
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// The ASCII-compatible encoding, suitable for WHOIS and DNS queries.
    pub fn ascii(&self) -> &str {
        &self.ascii
    }

    /// Whether the name needed IDNA conversion.
    pub fn is_idn(&self) -> bool {
        self.name != self.ascii
    }
}

impl std::fmt::Display for NormalizedDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Validate and canonicalize a raw domain string.
///
/// The input is trimmed and lowercased, then accepted if it matches the
/// strict label grammar. Otherwise it is accepted only as an internationalized
/// name, i.e. when IDNA conversion succeeds and actually changes the string.
///
/// # Errors
///
/// Returns `DomainCheckError::InvalidDomain` for empty input, input outside
/// 1-253 characters, or input that is neither a valid ASCII name nor a
/// convertible IDN.
pub fn normalize_domain(raw: &str) -> Result<NormalizedDomain, DomainCheckError> {
    let name = raw.trim().to_lowercase();

    if name.is_empty() {
        return Err(DomainCheckError::invalid_domain(
            raw,
            "Domain must be a non-empty string",
        ));
    }

    let length = name.chars().count();
    if !(MIN_DOMAIN_LENGTH..=MAX_DOMAIN_LENGTH).contains(&length) {
        return Err(DomainCheckError::invalid_domain(
            raw,
            format!(
                "Domain length must be between {} and {} characters",
                MIN_DOMAIN_LENGTH, MAX_DOMAIN_LENGTH
            ),
        ));
    }

    if is_valid_ascii_domain(&name) {
        return Ok(NormalizedDomain {
            ascii: name.clone(),
            name,
        });
    }

    match idn_to_ascii(&name) {
        Some(ascii) => Ok(NormalizedDomain { name, ascii }),
        None => Err(DomainCheckError::invalid_domain(raw, "Invalid domain format")),
    }
}

/// Whether a lowercased name matches the strict ASCII label grammar.
pub fn is_valid_ascii_domain(name: &str) -> bool {
    LABEL_SEQUENCE.is_match(name)
}

/// Convert an internationalized name to its ASCII-compatible form.
///
/// Returns `None` when conversion fails or leaves the string unchanged:
/// an unchanged string that already failed the strict grammar is not an IDN,
/// just a malformed name.
pub fn idn_to_ascii(name: &str) -> Option<String> {
    match idna::domain_to_ascii(name) {
        Ok(ascii) if ascii != name && !ascii.is_empty() => Some(ascii),
        _ => None,
    }
}

/// Convert any label (such as a TLD) to ASCII, leaving it untouched if
/// conversion is not possible.
pub fn label_to_ascii(label: &str) -> String {
    idna::domain_to_ascii(label).unwrap_or_else(|_| label.to_string())
}
