//! Progress logging utilities.

use log::info;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Logs progress information about the crawl.
///
/// # Arguments
///
/// * `start_time` - The start time of the crawl
/// * `processed` - Identifiers finished so far (recorded or failed for good)
/// * `recorded` - Identifiers that produced a record
/// * `total` - Identifiers in the crawl
pub fn log_progress(
    start_time: std::time::Instant,
    processed: &AtomicUsize,
    recorded: &AtomicUsize,
    total: usize,
) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let processed = processed.load(Ordering::SeqCst);
    let recorded = recorded.load(Ordering::SeqCst);
    let rate = if elapsed_secs > 0.0 {
        processed as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Processed {}/{} channels ({} recorded) in {:.2} seconds (~{:.2} channels/sec)",
        processed, total, recorded, elapsed_secs, rate
    );
}
