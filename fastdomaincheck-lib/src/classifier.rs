//! WHOIS response classification.
//!
//! WHOIS has no standard "not found" answer, so availability is decided by an
//! ordered list of rules evaluated with early exit. The rules lean towards
//! "registered": a domain wrongly reported as available is worse than one
//! wrongly reported as taken, so anything ambiguous ends up registered.

use crate::protocols::registry::WhoisRegistry;
use lazy_static::lazy_static;
use regex::Regex;

/// Responses shorter than this (after trimming) are checked for error text.
pub const SHORT_RESPONSE_LIMIT: usize = 100;

lazy_static! {
    /// Line-anchored markers that only appear in records of registered domains.
    static ref REGISTRATION_INDICATORS: Vec<Regex> = compile(&[
        r"(?im)^\s*domain name:\s*\S+",
        r"(?im)^\s*registry domain id:\s*\S+",
        r"(?im)^\s*registrar whois server:",
        r"(?im)^\s*registrar url:",
        r"(?im)^\s*creation date:",
        r"(?im)^\s*created:",
        r"(?im)^\s*registered on:",
        r"(?im)^\s*expiry date:",
        r"(?im)^\s*expiration date:",
        r"(?im)^\s*registry expiry date:",
        r"(?im)^\s*registrar:\s*\S+",
        r"(?im)^\s*registrant",
        r"(?im)^\s*updated date:",
        r"(?im)^\s*last updated:",
        r"(?im)^\s*status:\s*(active|ok|registered|clienttransferprohibited)",
        r"(?im)^\s*domain status:\s*(active|ok|registered|clienttransferprohibited)",
        r"(?im)^\s*name server:",
        r"(?im)^\s*nameserver:",
        r"(?im)^\s*dns:",
        r"(?im)^\s*dnssec:",
        r"(?im)^\s*registrar iana id:",
        r"(?im)^\s*registrar abuse contact",
    ]);

    /// Generic "not registered" phrases shared by many registries.
    static ref UNREGISTERED_PATTERNS: Vec<Regex> = compile(&[
        r"(?im)^no match for domain",
        r#"(?im)^no match for ".*""#,
        r"(?im)^not found\.?\s*$",
        r"(?im)^domain not found",
        r"(?im)^no data found",
        r"(?im)^no entries found",
        r"(?im)^object does not exist",
        r"(?im)^%% no entries found",
        r"(?im)^not registered",
        r"(?im)^available for registration",
        r"(?im)^this domain is available",
        r"(?im)^status:\s*available",
        r"(?im)^domain status:\s*available",
        // The whole response is nothing but a one-word verdict.
        r"(?i)\A\s*(not found|no match|available|free)\s*\z",
    ]);
}

/// Substrings whose presence anywhere turns an unregistered match into a
/// false positive.
const REGISTRATION_GUARD_TERMS: &[&str] = &[
    "registrar:",
    "creation date:",
    "domain name:",
    "registry domain id:",
];

/// Error and rate-limit vocabulary looked for in short responses.
const ERROR_TERMS: &[&str] = &[
    "error",
    "quota exceeded",
    "limit exceeded",
    "try again",
    "temporarily unavailable",
    "connection refused",
    "timeout",
    "rate limit",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("classifier pattern is a valid regex"))
        .collect()
}

/// The rule that decided a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationRule {
    /// No response text at all
    EmptyResponse,
    /// A strong registration marker was present
    RegistrationIndicator,
    /// A "not found" phrase matched and no registration data contradicted it
    UnregisteredPattern,
    /// A short response looked like an error or rate-limit notice
    ErrorResponse,
    /// Nothing matched
    ConservativeDefault,
}

impl std::fmt::Display for ClassificationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::EmptyResponse => "empty-response",
            Self::RegistrationIndicator => "registration-indicator",
            Self::UnregisteredPattern => "unregistered-pattern",
            Self::ErrorResponse => "error-response",
            Self::ConservativeDefault => "conservative-default",
        };
        f.write_str(name)
    }
}

/// Verdict on a WHOIS response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// `true` when the domain looks unregistered
    pub available: bool,
    /// Which rule produced the verdict
    pub rule: ClassificationRule,
}

/// What the rules look at.
pub struct ResponseView<'a> {
    text: &'a str,
    lowercase: String,
    tld_patterns: &'a [Regex],
}

impl<'a> ResponseView<'a> {
    pub fn new(text: &'a str, tld_patterns: &'a [Regex]) -> Self {
        Self {
            text,
            lowercase: text.to_lowercase(),
            tld_patterns,
        }
    }

    fn has_registration_data(&self) -> bool {
        REGISTRATION_GUARD_TERMS
            .iter()
            .any(|term| self.lowercase.contains(term))
    }
}

/// A rule returns `Some(available)` to decide, or `None` to pass.
type Rule = fn(&ResponseView<'_>) -> Option<bool>;

/// Rules in evaluation order. The conservative default follows the last one.
const RULES: &[(ClassificationRule, Rule)] = &[
    (ClassificationRule::EmptyResponse, empty_response),
    (ClassificationRule::RegistrationIndicator, registration_indicator),
    (ClassificationRule::UnregisteredPattern, unregistered_pattern),
    (ClassificationRule::ErrorResponse, error_response),
];

/// No data means the registry found nothing.
pub fn empty_response(view: &ResponseView<'_>) -> Option<bool> {
    view.text.is_empty().then_some(true)
}

/// Any strong registration marker settles it, whatever else the text says.
pub fn registration_indicator(view: &ResponseView<'_>) -> Option<bool> {
    REGISTRATION_INDICATORS
        .iter()
        .any(|re| re.is_match(view.text))
        .then_some(false)
}

/// Generic then registry-specific "not found" phrases, each guarded against
/// responses that also carry registration data.
pub fn unregistered_pattern(view: &ResponseView<'_>) -> Option<bool> {
    for pattern in UNREGISTERED_PATTERNS.iter().chain(view.tld_patterns) {
        if pattern.is_match(view.text) && !view.has_registration_data() {
            return Some(true);
        }
    }
    None
}

/// Short error or rate-limit notices must never read as "available".
pub fn error_response(view: &ResponseView<'_>) -> Option<bool> {
    if view.text.trim().chars().count() >= SHORT_RESPONSE_LIMIT {
        return None;
    }
    ERROR_TERMS
        .iter()
        .any(|term| view.lowercase.contains(term))
        .then_some(false)
}

/// Classify a WHOIS response for a domain under `tld`.
///
/// Pure function of the text, the TLD and the registry's pattern table.
pub fn classify(text: Option<&str>, tld: &str, registry: &WhoisRegistry) -> Classification {
    let view = ResponseView::new(text.unwrap_or(""), registry.unregistered_patterns(tld));
    classify_view(&view)
}

/// Run the rule list over a prepared view.
pub fn classify_view(view: &ResponseView<'_>) -> Classification {
    RULES
        .iter()
        .find_map(|(rule, check)| {
            check(view).map(|available| Classification {
                available,
                rule: *rule,
            })
        })
        .unwrap_or(Classification {
            available: false,
            rule: ClassificationRule::ConservativeDefault,
        })
}

/// Shorthand for `classify(..).available`.
pub fn is_unregistered(text: Option<&str>, tld: &str, registry: &WhoisRegistry) -> bool {
    classify(text, tld, registry).available
}
