//! Statistics display for the price database
//!
//! This module renders `PriceStats` and `BatchReport` for the terminal.

use crate::output::BatchReport;
use crate::storage::PriceStats;
use std::fmt::Write;

/// Renders database statistics as text
pub fn format_statistics(stats: &PriceStats) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Price Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total records: {}", stats.total_records);
    let _ = writeln!(out, "  Products tracked: {}", stats.products);
    let _ = writeln!(out, "  Sites: {}", stats.sites);
    match stats.last_update {
        Some(at) => {
            let _ = writeln!(out, "  Last update: {}", at.format("%Y-%m-%d %H:%M:%S UTC"));
        }
        None => {
            let _ = writeln!(out, "  Last update: never");
        }
    }
    out
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &PriceStats) {
    print!("{}", format_statistics(stats));
}

/// Renders a batch outcome as text
pub fn format_batch_report(report: &BatchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Run Summary ===\n");
    let _ = writeln!(out, "  Succeeded: {}", report.succeeded);
    let _ = writeln!(out, "  Without price: {}", report.missing_price);
    let _ = writeln!(out, "  Failed: {}", report.failed);

    if !report.failures.is_empty() {
        let _ = writeln!(out, "\nFailures:");
        for (url, message) in &report.failures {
            let _ = writeln!(out, "  - {}: {}", url, message);
        }
    }

    let rate = if report.total() > 0 {
        (report.succeeded as f64 / report.total() as f64) * 100.0
    } else {
        0.0
    };
    let _ = writeln!(
        out,
        "\nSuccess Rate: {:.1}% ({} / {} URLs)",
        rate,
        report.succeeded,
        report.total()
    );
    out
}

/// Prints a batch outcome to stdout
pub fn print_batch_report(report: &BatchReport) {
    print!("{}", format_batch_report(report));
}
