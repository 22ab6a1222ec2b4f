//! Terminal display logic for the fastdomaincheck CLI.
//!
//! Colored result lines, grouped `--pretty` output, the spinner, headers
//! and summaries. Everything decorative goes to stderr or is only printed
//! in text mode, so JSON and CSV output stay machine-readable.

use console::{pad_str, style, Alignment, Term};
use fastdomaincheck_lib::{AvailabilityResult, CheckConfig, CheckMethod, PacingPolicy};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::ErrorStats;

const DOMAIN_WIDTH: usize = 30;

// ── Spinner ──────────────────────────────────────────────────────────────────

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// An async braille-dot spinner that writes to stderr so stdout stays clean.
pub struct Spinner {
    running: Arc<AtomicBool>,
    handle: Option<tokio::task::JoinHandle<()>>,
}

impl Spinner {
    /// Start a spinner with the given message.
    ///
    /// Returns `None` when stderr is not a terminal.
    pub fn start(message: String) -> Option<Self> {
        if !Term::stderr().is_term() {
            return None;
        }

        let running = Arc::new(AtomicBool::new(true));
        let running_clone = running.clone();

        let handle = tokio::spawn(async move {
            let term = Term::stderr();
            let mut idx = 0usize;
            while running_clone.load(Ordering::Relaxed) {
                let frame = SPINNER_FRAMES[idx % SPINNER_FRAMES.len()];
                let _ = term.clear_line();
                let _ = term.write_str(&format!("{} {}", style(frame).cyan(), message));
                idx += 1;
                tokio::time::sleep(Duration::from_millis(80)).await;
            }
            let _ = term.clear_line();
        });

        Some(Self {
            running,
            handle: Some(handle),
        })
    }

    /// Stop the spinner and clear the line.
    pub async fn stop(mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

// ── Header ───────────────────────────────────────────────────────────────────

/// Print a styled header at the start of a pretty run.
pub fn print_header(domain_count: usize, config: &CheckConfig) {
    println!(
        "{} {} {}",
        style("fastdomaincheck").bold(),
        style(format!("v{}", env!("CARGO_PKG_VERSION"))).dim(),
        style(format!(
            "- Checking {} domain{}",
            domain_count,
            plural(domain_count)
        ))
        .dim(),
    );
    println!("{}", style(describe_config(config)).dim());
    println!();
}

/// One-line description of the settings that shape a run.
pub fn describe_config(config: &CheckConfig) -> String {
    let pacing = match config.effective_pacing() {
        PacingPolicy::FixedDelay(d) if d.is_zero() => "off".to_string(),
        PacingPolicy::FixedDelay(d) => format!("{}ms delay", d.as_millis()),
        PacingPolicy::TokenBucket(d) if d.is_zero() => "off".to_string(),
        PacingPolicy::TokenBucket(d) => format!("1 per {}ms", d.as_millis()),
        PacingPolicy::Disabled => "off".to_string(),
    };

    format!(
        "Concurrency: {} | Pacing: {} | WHOIS timeout: {}s",
        config.concurrency,
        pacing,
        config.whois_timeout.as_secs()
    )
}

// ── Single result line ───────────────────────────────────────────────────────

/// Format and print a single domain result with colors and alignment.
///
/// If `counter` is Some((current, total)), a progress prefix like `[3/8]` is shown.
pub fn print_result(result: &AvailabilityResult, debug: bool, counter: Option<(usize, usize)>) {
    let padded_domain = pad_str(&result.domain, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    let prefix = match counter {
        Some((cur, total)) => format!("{} ", style(format!("[{}/{}]", cur, total)).dim()),
        None => String::new(),
    };

    let status = match (&result.error, result.available) {
        (Some(_), _) => format!(
            "{}  {}",
            style("ERROR").yellow(),
            style(brief_error(result)).dim()
        ),
        (None, true) => style("AVAILABLE").green().bold().to_string(),
        (None, false) => style("TAKEN").red().bold().to_string(),
    };

    println!("  {}{}  {}", prefix, style(&padded_domain).white(), status);

    if debug {
        if let Some(detail) = method_detail(result) {
            println!("    {} {}", style("└─").dim(), detail);
        }
    }
}

// ── Grouped batch output ─────────────────────────────────────────────────────

/// Print results grouped by status: Available, Taken, Errors.
/// Empty sections are omitted entirely.
pub fn print_grouped_results(results: &[AvailabilityResult], debug: bool) {
    let mut available: Vec<&AvailabilityResult> = Vec::new();
    let mut taken: Vec<&AvailabilityResult> = Vec::new();
    let mut failed: Vec<&AvailabilityResult> = Vec::new();

    for r in results {
        match (&r.error, r.available) {
            (Some(_), _) => failed.push(r),
            (None, true) => available.push(r),
            (None, false) => taken.push(r),
        }
    }

    if !available.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Available ({}) ", available.len()))
                .green()
                .bold(),
            style("─".repeat(40)).green().dim(),
        );
        for r in &available {
            print_grouped_line(r, debug);
        }
        println!();
    }

    if !taken.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Taken ({}) ", taken.len())).red().bold(),
            style("─".repeat(44)).red().dim(),
        );
        for r in &taken {
            print_grouped_line(r, debug);
        }
        println!();
    }

    if !failed.is_empty() {
        println!(
            "  {} {}",
            style(format!("── Errors ({}) ", failed.len())).yellow().bold(),
            style("─".repeat(43)).yellow().dim(),
        );
        for r in &failed {
            print_grouped_line(r, debug);
        }
        println!();
    }
}

/// Print a single line inside a grouped section.
fn print_grouped_line(result: &AvailabilityResult, debug: bool) {
    let padded = pad_str(&result.domain, DOMAIN_WIDTH, Alignment::Left, Some(".."));

    if result.error.is_some() {
        println!(
            "    {}  {}",
            style(&padded).white(),
            style(brief_error(result)).dim()
        );
    } else {
        println!("    {}", style(&padded).white());
    }

    if debug {
        if let Some(detail) = method_detail(result) {
            println!("      {} {}", style("└─").dim(), detail);
        }
    }
}

// ── Summary ──────────────────────────────────────────────────────────────────

/// Print the final summary bar with colored counts.
pub fn print_summary(total: usize, available: usize, taken: usize, failed: usize, duration: Duration) {
    println!(
        "  {}",
        style("────────────────────────────────────────────────────").dim()
    );
    println!(
        "  {} domain{} in {:.1}s  {}  {}  {}  {}  {}  {}",
        style(total).bold(),
        plural(total),
        duration.as_secs_f64(),
        style("|").dim(),
        style(format!("{} available", available)).green(),
        style("|").dim(),
        style(format!("{} taken", taken)).red(),
        style("|").dim(),
        style(format!("{} failed", failed)).yellow(),
    );
}

// ── Error summary ────────────────────────────────────────────────────────────

/// Print categorized notes: rejected input, other failures and DNS fallbacks.
pub fn print_error_summary(error_stats: &ErrorStats) {
    if error_stats.has_errors() {
        println!("  {}", style("Some domains could not be checked:").yellow());
    }

    print_category(&error_stats.invalid_domains, "invalid domain", "invalid domains");
    print_category(&error_stats.other_errors, "other error", "other errors");

    if !error_stats.dns_fallbacks.is_empty() {
        println!(
            "  {} {}",
            style("Answered by DNS after WHOIS failed").dim(),
            style(format!(
                "({}): {}",
                error_stats.dns_fallbacks.len(),
                format_list(&error_stats.dns_fallbacks, 5)
            ))
            .dim(),
        );
    }
}

fn print_category(domains: &[String], singular: &str, plural_label: &str) {
    if domains.is_empty() {
        return;
    }
    println!(
        "  {} {} {}: {}",
        style("•").dim(),
        domains.len(),
        if domains.len() == 1 { singular } else { plural_label },
        format_list(domains, 5),
    );
}

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Join at most `max_show` names, noting how many were left out.
pub fn format_list(domains: &[String], max_show: usize) -> String {
    if domains.len() <= max_show {
        domains.join(", ")
    } else {
        let shown = &domains[..max_show];
        let remaining = domains.len() - max_show;
        format!("{}, ... and {} more", shown.join(", "), remaining)
    }
}

/// Whether an error message comes from input validation.
pub fn is_validation_error(message: &str) -> bool {
    let m = message.to_lowercase();
    m.contains("invalid domain") || m.contains("non-empty") || m.contains("domain length")
}

/// Extract a brief error reason from a failed result.
fn brief_error(result: &AvailabilityResult) -> &'static str {
    match &result.error {
        Some(msg) if is_validation_error(msg) => "(invalid domain)",
        Some(msg) if msg.to_lowercase().contains("timeout") => "(timeout)",
        Some(_) => "(error)",
        None => "",
    }
}

/// Which method answered, for `--debug`.
fn method_detail(result: &AvailabilityResult) -> Option<String> {
    match result.method? {
        CheckMethod::Whois => Some("via WHOIS".to_string()),
        CheckMethod::Dns if result.used_fallback() => {
            Some("via DNS (WHOIS failed)".to_string())
        }
        CheckMethod::Dns => Some("via DNS (no WHOIS server)".to_string()),
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        ""
    } else {
        "s"
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
