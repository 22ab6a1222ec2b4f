//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and environment
//! variables and merging them with proper precedence rules:
//! built-in defaults < config files (XDG < home < local) < environment < CLI.

use crate::checker::DEBUG_WHOIS_ENV;
use crate::error::DomainCheckError;
use crate::protocols::WhoisRegistry;
use crate::types::{CheckConfig, PacingPolicy};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Highest accepted concurrency.
pub const MAX_CONCURRENCY: usize = 10;

/// Highest accepted referral hop budget.
pub const MAX_REFERRALS: usize = 10;

/// Configuration loaded from TOML files.
///
/// ```toml
/// [defaults]
/// whois_timeout = "10s"
/// delay_ms = 300
/// concurrency = 1
///
/// [whois_servers]
/// dev = "whois.nic.google"
///
/// [unregistered_patterns]
/// dev = ["(?i)^domain not found"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Default values for checker options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,

    /// Extra or overriding TLD -> WHOIS server entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_servers: Option<HashMap<String, String>>,

    /// Extra registry-specific "not found" patterns per TLD
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unregistered_patterns: Option<HashMap<String, Vec<String>>>,
}

/// Default values that map to checker options.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct DefaultsConfig {
    /// Overall WHOIS budget (as string, e.g., "10s", "1m")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whois_timeout: Option<String>,

    /// Pause between checks in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,

    /// Number of domains checked at once
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,

    /// Referral hop budget
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_referrals: Option<usize>,

    /// Emit WHOIS diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug_whois: Option<bool>,
}

impl FileConfig {
    /// Layer this file's `[defaults]` over `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        let Some(defaults) = &self.defaults else {
            return config;
        };

        if let Some(timeout) = defaults
            .whois_timeout
            .as_deref()
            .and_then(parse_timeout_string)
        {
            config.whois_timeout = Duration::from_secs(timeout);
        }
        if let Some(delay) = defaults.delay_ms {
            config.pacing = PacingPolicy::FixedDelay(Duration::from_millis(delay));
        }
        if let Some(concurrency) = defaults.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(hops) = defaults.max_referrals {
            config.max_referrals = hops;
        }
        if let Some(debug) = defaults.debug_whois {
            config.debug_whois = debug;
        }
        config
    }

    /// Whether the file extends the WHOIS tables.
    pub fn has_registry_overlay(&self) -> bool {
        self.whois_servers.as_ref().is_some_and(|m| !m.is_empty())
            || self
                .unregistered_patterns
                .as_ref()
                .is_some_and(|m| !m.is_empty())
    }

    /// Build the registry to use: `base` plus this file's tables.
    ///
    /// Returns `base` itself when the file adds nothing.
    pub fn registry(&self, base: Arc<WhoisRegistry>) -> Result<Arc<WhoisRegistry>, DomainCheckError> {
        if !self.has_registry_overlay() {
            return Ok(base);
        }
        let servers = self.whois_servers.clone().unwrap_or_default();
        let patterns = self.unregistered_patterns.clone().unwrap_or_default();
        Ok(Arc::new(base.with_overlay(&servers, &patterns)?))
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which config files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// `FileError` when the file is missing or unreadable, `ConfigError` when
    /// it is not valid TOML or fails validation.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, DomainCheckError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(DomainCheckError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            DomainCheckError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content)?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// A file that exists but fails to load is skipped with a warning.
    pub fn discover_and_load(&self) -> Result<FileConfig, DomainCheckError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "ignoring configuration file");
                }
            }
        }

        if self.verbose {
            for path in &loaded_files {
                tracing::info!(path = %path.display(), "loaded configuration file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./fastdomaincheck.toml", "./.fastdomaincheck.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        [".fastdomaincheck.toml", "fastdomaincheck.toml"]
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("fastdomaincheck").join("config.toml");
        path.exists().then_some(path)
    }

    /// Merge two configurations; values from `higher` win.
    ///
    /// Server tables are merged key by key. Pattern lists for the same TLD
    /// are concatenated, lower first.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        FileConfig {
            defaults: match (lower.defaults, higher.defaults) {
                (Some(mut lower_defaults), Some(higher_defaults)) => {
                    if higher_defaults.whois_timeout.is_some() {
                        lower_defaults.whois_timeout = higher_defaults.whois_timeout;
                    }
                    if higher_defaults.delay_ms.is_some() {
                        lower_defaults.delay_ms = higher_defaults.delay_ms;
                    }
                    if higher_defaults.concurrency.is_some() {
                        lower_defaults.concurrency = higher_defaults.concurrency;
                    }
                    if higher_defaults.max_referrals.is_some() {
                        lower_defaults.max_referrals = higher_defaults.max_referrals;
                    }
                    if higher_defaults.debug_whois.is_some() {
                        lower_defaults.debug_whois = higher_defaults.debug_whois;
                    }
                    Some(lower_defaults)
                }
                (lower_defaults, higher_defaults) => higher_defaults.or(lower_defaults),
            },
            whois_servers: match (lower.whois_servers, higher.whois_servers) {
                (Some(mut lower_servers), Some(higher_servers)) => {
                    lower_servers.extend(higher_servers);
                    Some(lower_servers)
                }
                (lower_servers, higher_servers) => higher_servers.or(lower_servers),
            },
            unregistered_patterns: match (lower.unregistered_patterns, higher.unregistered_patterns)
            {
                (Some(mut lower_patterns), Some(higher_patterns)) => {
                    for (tld, patterns) in higher_patterns {
                        lower_patterns.entry(tld).or_default().extend(patterns);
                    }
                    Some(lower_patterns)
                }
                (lower_patterns, higher_patterns) => higher_patterns.or(lower_patterns),
            },
        }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), DomainCheckError> {
        if let Some(defaults) = &config.defaults {
            if let Some(concurrency) = defaults.concurrency {
                if concurrency == 0 || concurrency > MAX_CONCURRENCY {
                    return Err(DomainCheckError::config(format!(
                        "Concurrency must be between 1 and {}",
                        MAX_CONCURRENCY
                    )));
                }
            }

            if let Some(timeout_str) = &defaults.whois_timeout {
                match parse_timeout_string(timeout_str) {
                    Some(secs) if secs > 0 => {}
                    _ => {
                        return Err(DomainCheckError::config(format!(
                            "Invalid timeout format '{}'. Use format like '5s', '30s', '2m'",
                            timeout_str
                        )));
                    }
                }
            }

            if let Some(hops) = defaults.max_referrals {
                if hops > MAX_REFERRALS {
                    return Err(DomainCheckError::config(format!(
                        "max_referrals must be at most {}",
                        MAX_REFERRALS
                    )));
                }
            }
        }

        if let Some(servers) = &config.whois_servers {
            for (tld, server) in servers {
                if tld.trim().is_empty() || server.trim().is_empty() {
                    return Err(DomainCheckError::config(format!(
                        "Invalid WHOIS server entry '{}' = '{}'",
                        tld, server
                    )));
                }
            }
        }

        if let Some(patterns) = &config.unregistered_patterns {
            for (tld, tld_patterns) in patterns {
                for pattern in tld_patterns {
                    Regex::new(pattern).map_err(|e| {
                        DomainCheckError::config(format!(
                            "Invalid pattern for TLD '{}': {}",
                            tld, e
                        ))
                    })?;
                }
            }
        }

        Ok(())
    }
}

/// Environment variable configuration that mirrors CLI options.
///
/// Values come from `FDC_*` variables plus `DEBUG_WHOIS`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvConfig {
    pub whois_timeout: Option<Duration>,
    pub delay_ms: Option<u64>,
    pub concurrency: Option<usize>,
    pub max_referrals: Option<usize>,
    pub debug_whois: Option<bool>,
}

impl EnvConfig {
    /// Parse from an arbitrary variable lookup. Invalid values are logged
    /// and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env_config = EnvConfig::default();

        // FDC_WHOIS_TIMEOUT - overall WHOIS budget
        if let Some(val) = lookup("FDC_WHOIS_TIMEOUT") {
            match parse_timeout_string(&val) {
                Some(secs) if secs > 0 => {
                    env_config.whois_timeout = Some(Duration::from_secs(secs));
                }
                _ => {
                    tracing::warn!(
                        "Invalid FDC_WHOIS_TIMEOUT='{}', use format like '5s', '30s', '2m'",
                        val
                    );
                }
            }
        }

        // FDC_DELAY_MS - pause between checks
        if let Some(val) = lookup("FDC_DELAY_MS") {
            match val.trim().parse::<u64>() {
                Ok(delay) => env_config.delay_ms = Some(delay),
                Err(_) => tracing::warn!("Invalid FDC_DELAY_MS='{}', must be a number", val),
            }
        }

        // FDC_CONCURRENCY - domains checked at once
        if let Some(val) = lookup("FDC_CONCURRENCY") {
            match val.trim().parse::<usize>() {
                Ok(concurrency) if (1..=MAX_CONCURRENCY).contains(&concurrency) => {
                    env_config.concurrency = Some(concurrency);
                }
                _ => tracing::warn!(
                    "Invalid FDC_CONCURRENCY='{}', must be 1-{}",
                    val,
                    MAX_CONCURRENCY
                ),
            }
        }

        // FDC_MAX_REFERRALS - referral hop budget
        if let Some(val) = lookup("FDC_MAX_REFERRALS") {
            match val.trim().parse::<usize>() {
                Ok(hops) if hops <= MAX_REFERRALS => env_config.max_referrals = Some(hops),
                _ => tracing::warn!(
                    "Invalid FDC_MAX_REFERRALS='{}', must be 0-{}",
                    val,
                    MAX_REFERRALS
                ),
            }
        }

        // DEBUG_WHOIS - any value other than an explicit "off" enables diagnostics
        if let Some(val) = lookup(DEBUG_WHOIS_ENV) {
            env_config.debug_whois = Some(debug_whois_flag(&val));
        }

        env_config
    }

    /// Layer these values over `config`.
    pub fn apply_to(&self, mut config: CheckConfig) -> CheckConfig {
        if let Some(timeout) = self.whois_timeout {
            config.whois_timeout = timeout;
        }
        if let Some(delay) = self.delay_ms {
            config.pacing = PacingPolicy::FixedDelay(Duration::from_millis(delay));
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        if let Some(hops) = self.max_referrals {
            config.max_referrals = hops;
        }
        if let Some(debug) = self.debug_whois {
            config.debug_whois = debug;
        }
        config
    }
}

/// Load configuration from environment variables.
///
/// Invalid values are logged as warnings and ignored.
pub fn load_env_config(verbose: bool) -> EnvConfig {
    let env_config = EnvConfig::from_lookup(|key| env::var(key).ok());
    if verbose && env_config != EnvConfig::default() {
        tracing::info!(?env_config, "using environment configuration");
    }
    env_config
}

/// Interpret a `DEBUG_WHOIS` value: `false`, `0`, `no` and `off` disable.
pub(crate) fn debug_whois_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_lowercase().as_str(),
        "false" | "0" | "no" | "off"
    )
}

/// Parse a timeout string like "5s", "30s", "2m" into seconds.
///
/// A bare number is taken as seconds.
pub fn parse_timeout_string(timeout_str: &str) -> Option<u64> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.parse::<u64>().ok().map(|m| m * 60)
    } else {
        timeout_str.parse::<u64>().ok()
    }
}
