//! Statistics printing.

use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorCategory, ProcessingStats};
use crate::run::CrawlReport;

/// Prints a one-line summary of the run.
///
/// Works with both plain and JSON log formats (log::info! handles formatting).
pub fn print_summary(report: &CrawlReport) {
    info!(
        "✅ Processed {} channel{} ({} recorded, {} failed, {:.1}% success) in {:.1}s",
        report.processed,
        if report.processed == 1 { "" } else { "s" },
        report.recorded,
        report.failed,
        report.success_rate() * 100.0,
        report.elapsed_seconds
    );
}

/// Prints failure and retry counts per category to the log.
pub fn print_error_statistics(stats: &ProcessingStats) {
    let total_failures = stats.total_failures();
    let total_retries = stats.total_retries();

    if total_failures > 0 {
        info!("Failure Counts ({} total):", total_failures);
        for category in ErrorCategory::iter() {
            let count = stats.get_failure_count(category);
            if count > 0 {
                info!("   {}: {}", category.as_str(), count);
            }
        }
    }

    if total_retries > 0 {
        info!("Retry Counts ({} total):", total_retries);
        for category in ErrorCategory::iter() {
            let count = stats.get_retry_count(category);
            if count > 0 {
                info!("   {}: {}", category.as_str(), count);
            }
        }
    }
}
