//! Output formatting utilities for CLI commands
//!
//! Everything goes to stderr so it never mixes with forwarded records.

use colored::Colorize;
use dropsample_filter::SamplingReport;

/// Print success message
pub fn success(msg: &str) {
    eprintln!("{} {}", "✓".green(), msg);
}

/// Print warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", "⚠".yellow(), msg);
}

/// Print the final sampling summary
pub fn summary(report: &SamplingReport) {
    let c = &report.counters;
    eprintln!("{}", "Sampling summary".bold());
    eprintln!("  {:<12} {}", "allowed", c.allowed.to_string().green());
    eprintln!("  {:<12} {}", "skipped", c.skipped.to_string().red());
    eprintln!("  {:<12} {}", "annotated", c.annotated);
    eprintln!("  {:<12} {}", "unannotated", c.unannotated);
    eprintln!("  {:<12} {:.2}%", "sampled", report.sample_pct * 100.0);
}
