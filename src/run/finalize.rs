//! Crawl finalization and cleanup.
//!
//! This module contains the `finalize_crawl` function which handles
//! cleanup and result aggregation after the worker pool has drained.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use crate::app::{log_progress, print_error_statistics, print_summary, shutdown_gracefully};
use crate::error_handling::ErrorCategory;

use super::resources::{CrawlContext, CrawlReport};

/// Finalizes a crawl and produces the report.
///
/// This function performs the following steps:
/// 1. Stop pending retry timers and the progress logging task
/// 2. Release the page loader
/// 3. Log final progress and per-category statistics
/// 4. Construct and return the crawl report
pub(crate) async fn finalize_crawl(
    ctx: Arc<CrawlContext>,
    start_time: Instant,
    cancel: CancellationToken,
    logging_task: Option<tokio::task::JoinHandle<()>>,
) -> CrawlReport {
    ctx.queue.stop();
    shutdown_gracefully(cancel, logging_task).await;
    ctx.deps.browser.shutdown().await;

    log_progress(
        start_time,
        &ctx.counters.processed,
        &ctx.counters.recorded,
        ctx.total,
    );
    print_error_statistics(&ctx.stats);

    let failures_by_category = ErrorCategory::iter()
        .map(|category| (category, ctx.stats.get_failure_count(category)))
        .filter(|(_, count)| *count > 0)
        .collect();

    let report = CrawlReport {
        total: ctx.total,
        processed: ctx.counters.processed.load(Ordering::SeqCst),
        recorded: ctx.counters.recorded.load(Ordering::SeqCst),
        failed: ctx.counters.failed.load(Ordering::SeqCst),
        retries: ctx.stats.total_retries(),
        failures_by_category,
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
        final_delay_ms: u64::try_from(ctx.rate.current_delay().await.as_millis())
            .unwrap_or(u64::MAX),
        output: None,
        failed_log: None,
    };
    print_summary(&report);
    report
}
