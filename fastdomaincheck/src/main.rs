//! FastDomainCheck CLI Application
//!
//! A command-line interface for bulk domain availability checks using WHOIS
//! with DNS fallback. This CLI application provides a user-friendly interface
//! to the fastdomaincheck-lib library.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::Parser;
use fastdomaincheck_lib::{
    load_env_config, parse_timeout_string, AvailabilityResult, CheckConfig, ConfigManager,
    DomainChecker, FileConfig, PacingPolicy, WhoisRegistry, MAX_BATCH_SIZE,
};
use futures::StreamExt;
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// CLI arguments for fastdomaincheck
#[derive(Parser, Debug)]
#[command(name = "fastdomaincheck")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check domain availability using WHOIS with DNS fallback")]
#[command(
    long_about = "Check domain availability using WHOIS with automatic DNS fallback.\n\nAmbiguous WHOIS answers are reported as taken: a domain is only shown as available when the registry clearly says so."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Fully qualified domain names to check
    #[arg(value_name = "DOMAINS", help_heading = "Domain Selection")]
    pub domains: Vec<String>,

    /// Input file with domains (one per line, '#' starts a comment)
    #[arg(
        short = 'f',
        long = "file",
        value_name = "FILE",
        help_heading = "Domain Selection"
    )]
    pub file: Option<String>,

    /// Output results in JSON format
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Output results in CSV format
    #[arg(long = "csv", help_heading = "Output Format")]
    pub csv: bool,

    /// Group results by status once all checks are done
    #[arg(short = 'p', long = "pretty", help_heading = "Output Format")]
    pub pretty: bool,

    /// Show which method answered for each domain
    #[arg(short = 'd', long = "debug", help_heading = "Output Format")]
    pub debug: bool,

    /// Domains checked at once (default: 1, max: 10)
    #[arg(
        short = 'c',
        long = "concurrency",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub concurrency: Option<usize>,

    /// Pause after each check in milliseconds (default: 300)
    #[arg(long = "delay-ms", value_name = "MS", help_heading = "Performance")]
    pub delay_ms: Option<u64>,

    /// Overall WHOIS budget per domain, e.g. "10s" or "1m" (default: 10s)
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Performance")]
    pub timeout: Option<String>,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Log WHOIS server, response excerpt and verdict for every query
    #[arg(long = "debug-whois", help_heading = "Configuration")]
    pub debug_whois: bool,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose", help_heading = "Configuration")]
    pub verbose: bool,
}

/// Per-category tallies of results that need the user's attention.
#[derive(Debug, Default)]
pub struct ErrorStats {
    pub(crate) invalid_domains: Vec<String>,
    pub(crate) other_errors: Vec<String>,
    pub(crate) dns_fallbacks: Vec<String>,
}

impl ErrorStats {
    fn record(&mut self, result: &AvailabilityResult) {
        match &result.error {
            Some(message) if ui::is_validation_error(message) => {
                self.invalid_domains.push(result.domain.clone());
            }
            Some(_) => self.other_errors.push(result.domain.clone()),
            None if result.used_fallback() => self.dns_fallbacks.push(result.domain.clone()),
            None => {}
        }
    }

    fn has_errors(&self) -> bool {
        !self.invalid_domains.is_empty() || !self.other_errors.is_empty()
    }

    fn has_notes(&self) -> bool {
        self.has_errors() || !self.dns_fallbacks.is_empty()
    }
}

/// Running counts for the final summary.
#[derive(Debug, Default)]
struct Tally {
    available: usize,
    taken: usize,
    failed: usize,
}

impl Tally {
    fn record(&mut self, result: &AvailabilityResult) {
        if result.error.is_some() {
            self.failed += 1;
        } else if result.available {
            self.available += 1;
        } else {
            self.taken += 1;
        }
    }
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = validate_args(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    init_logging(args.verbose);

    if let Err(e) = run_domain_check(args).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Logs go to stderr so stdout carries only results.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn validate_args(args: &Args) -> Result<(), String> {
    if args.domains.is_empty() && args.file.is_none() {
        return Err("You must specify domain names or a file with --file".to_string());
    }

    if args.json && args.csv {
        return Err("Cannot specify multiple output formats (--json, --csv)".to_string());
    }

    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 || concurrency > 10 {
            return Err("Concurrency must be between 1 and 10".to_string());
        }
    }

    if let Some(timeout) = &args.timeout {
        if !matches!(parse_timeout_string(timeout), Some(secs) if secs > 0) {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    Ok(())
}

async fn run_domain_check(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let (config, registry) = build_config(&args)?;
    let domains = get_domains_to_check(&args).await?;

    if args.verbose {
        tracing::info!(
            domains = domains.len(),
            concurrency = config.concurrency,
            whois_servers = registry.len(),
            "starting checks"
        );
    }

    let checker = DomainChecker::with_config(config).with_registry(registry);

    if args.json || args.csv || args.pretty {
        run_batch_check(&checker, &domains, &args).await
    } else {
        run_streaming_check(&checker, &domains, &args).await
    }
}

/// Print each result as soon as it is known.
async fn run_streaming_check(
    checker: &DomainChecker,
    domains: &[String],
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let total = domains.len();
    let mut tally = Tally::default();
    let mut error_stats = ErrorStats::default();
    let mut completed = 0usize;
    let start_time = std::time::Instant::now();

    for batch in domains.chunks(MAX_BATCH_SIZE) {
        let mut stream = checker.check_domains_stream(batch)?;
        while let Some(result) = stream.next().await {
            completed += 1;
            tally.record(&result);
            error_stats.record(&result);

            let counter = (total > 1).then_some((completed, total));
            ui::print_result(&result, args.debug, counter);
        }
    }

    if total > 1 {
        println!();
        ui::print_summary(total, tally.available, tally.taken, tally.failed, start_time.elapsed());
    }
    if error_stats.has_notes() {
        println!();
        ui::print_error_summary(&error_stats);
    }

    Ok(())
}

/// Collect every result, then print them in the requested format.
async fn run_batch_check(
    checker: &DomainChecker,
    domains: &[String],
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let is_structured = args.json || args.csv;

    if args.pretty && !is_structured {
        ui::print_header(domains.len(), checker.config());
    }

    let spinner = if !is_structured && domains.len() > 1 {
        ui::Spinner::start(format!("Checking {} domains...", domains.len()))
    } else {
        None
    };

    let start_time = std::time::Instant::now();
    let results = check_in_batches(checker, domains).await;
    let duration = start_time.elapsed();

    if let Some(s) = spinner {
        s.stop().await;
    }

    let results = results?;
    display_results(&results, args, duration)?;

    Ok(())
}

/// Run `domains` through the checker in chunks the library accepts.
async fn check_in_batches(
    checker: &DomainChecker,
    domains: &[String],
) -> Result<Vec<AvailabilityResult>, Box<dyn std::error::Error>> {
    let mut results = Vec::with_capacity(domains.len());
    for batch in domains.chunks(MAX_BATCH_SIZE) {
        results.extend(checker.check_domains(batch).await?);
    }
    Ok(results)
}

/// Build CheckConfig and the WHOIS server table.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (FDC_*, DEBUG_WHOIS)
/// 3. Config file (`--config`, or discovered local > home > XDG)
/// 4. Built-in defaults
fn build_config(
    args: &Args,
) -> Result<(CheckConfig, Arc<WhoisRegistry>), Box<dyn std::error::Error>> {
    let config_manager = ConfigManager::new(args.verbose);

    let file_config = match &args.config {
        Some(path) => config_manager
            .load_file(path)
            .map_err(|e| format!("Failed to load config file '{}': {}", path, e))?,
        None => config_manager.discover_and_load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "config discovery failed, using defaults");
            FileConfig::default()
        }),
    };

    let registry = file_config.registry(WhoisRegistry::builtin())?;

    let config = file_config.apply_to(CheckConfig::default());
    let config = load_env_config(args.verbose).apply_to(config);
    let config = apply_cli_args_to_config(config, args);

    Ok((config, registry))
}

/// Apply CLI arguments to config (highest precedence).
///
/// Only flags the user actually passed override earlier layers.
fn apply_cli_args_to_config(mut config: CheckConfig, args: &Args) -> CheckConfig {
    if let Some(concurrency) = args.concurrency {
        config = config.with_concurrency(concurrency);
    }
    if let Some(delay) = args.delay_ms {
        config.pacing = PacingPolicy::FixedDelay(Duration::from_millis(delay));
    }
    if let Some(secs) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config.whois_timeout = Duration::from_secs(secs);
    }
    if args.debug_whois {
        config.debug_whois = true;
    }
    config
}

/// Get the list of domains to check from CLI args and file, in order.
async fn get_domains_to_check(args: &Args) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let mut domains = args.domains.clone();

    if let Some(file_path) = &args.file {
        domains.extend(read_domains_from_file(file_path).await?);
    }

    if domains.is_empty() {
        return Err("No domains to check".into());
    }

    Ok(domains)
}

async fn read_domains_from_file(file_path: &str) -> Result<Vec<String>, Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {}", file_path).into());
    }

    let content = std::fs::read_to_string(path)?;
    let domains = parse_domain_lines(&content);

    if domains.is_empty() {
        return Err("No valid domains found in the file.".into());
    }

    Ok(domains)
}

/// One domain per line; blank lines, full-line and trailing `#` comments are skipped.
fn parse_domain_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn display_results(
    results: &[AvailabilityResult],
    args: &Args,
    duration: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(results)?);
    } else if args.csv {
        print!("{}", format_csv(results));
    } else {
        display_text_results(results, args, duration);
    }

    Ok(())
}

/// Render results as CSV with a header row.
fn format_csv(results: &[AvailabilityResult]) -> String {
    let mut out = String::from("domain,available,method,fallback,error\n");

    for result in results {
        let method = result
            .method
            .map(|m| m.to_string().to_lowercase())
            .unwrap_or_default();
        let fallback = result.fallback.map(|f| f.to_string()).unwrap_or_default();
        let error = result.error.as_deref().unwrap_or("");

        out.push_str(&format!(
            "{},{},{},{},{}\n",
            csv_field(&result.domain),
            result.available,
            method,
            fallback,
            csv_field(error)
        ));
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Display results in human-readable text format
fn display_text_results(results: &[AvailabilityResult], args: &Args, duration: Duration) {
    ui::print_grouped_results(results, args.debug);

    let mut tally = Tally::default();
    let mut error_stats = ErrorStats::default();
    for result in results {
        tally.record(result);
        error_stats.record(result);
    }

    if results.len() > 1 {
        ui::print_summary(results.len(), tally.available, tally.taken, tally.failed, duration);
    }
    if error_stats.has_notes() {
        println!();
        ui::print_error_summary(&error_stats);
    }
}
