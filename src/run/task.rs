//! Per-identifier attempt processing.
//!
//! This module contains the logic for one attempt on one channel, including
//! success/failure/timeout handling and the retry decision.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, info, warn};

use crate::browser::Session;
use crate::error_handling::{classify_error, retry_decision, ErrorCategory, RetryDecision, ScrapeError};
use crate::extract::ChannelRecord;
use crate::input::ChannelIdentifier;
use crate::storage::FailureRecord;

use super::queue::WorkItem;
use super::resources::CrawlContext;

/// Grace period for the diagnostic snapshot of a timed-out attempt.
const TIMEOUT_SNAPSHOT_GRACE: Duration = Duration::from_secs(5);

/// Processes one work item.
///
/// Waits for the pacing slot, runs the attempt under the attempt timeout,
/// feeds the outcome back to the rate controller and then either records the
/// channel, schedules a retry, or logs a terminal failure.
pub(crate) async fn process_item(ctx: &Arc<CrawlContext>, item: WorkItem) {
    let waited = ctx.rate.next_delay().await;
    if !waited.is_zero() {
        debug!("Paced {}ms before {}", waited.as_millis(), item.identifier.url);
    }

    let session = ctx.deps.sessions.acquire();
    let started = Instant::now();
    let result = run_attempt(ctx, &session, &item.identifier).await;
    let latency = started.elapsed();

    match result {
        Ok(record) => handle_success(ctx, &item, record, latency).await,
        Err(e) => handle_failure(ctx, item, &session, e, latency).await,
    }
}

/// One attempt: open a page, load the about surface, extract, close.
///
/// The whole attempt shares one deadline. When the deadline expires during
/// extraction the page is snapshotted before it is closed; it is closed
/// either way.
async fn run_attempt(
    ctx: &CrawlContext,
    session: &Session,
    identifier: &ChannelIdentifier,
) -> Result<ChannelRecord, ScrapeError> {
    let budget = ctx.settings.attempt_timeout;
    let deadline = tokio::time::Instant::now() + budget;
    let timed_out = || ScrapeError::Timeout(budget.as_secs());

    let page = tokio::time::timeout_at(deadline, ctx.deps.browser.open_page(session))
        .await
        .map_err(|_| timed_out())??;

    let result =
        match tokio::time::timeout_at(deadline, load_and_extract(ctx, page.as_ref(), identifier))
            .await
        {
            Ok(result) => result,
            Err(_) => {
                let error = timed_out();
                let snapshot = ctx
                    .extractor
                    .capture_snapshot(page.as_ref(), identifier, &error);
                if tokio::time::timeout(TIMEOUT_SNAPSHOT_GRACE, snapshot)
                    .await
                    .is_err()
                {
                    debug!("Snapshot of timed-out page {} abandoned", identifier.url);
                }
                Err(error)
            }
        };
    page.close().await;
    result
}

async fn load_and_extract(
    ctx: &CrawlContext,
    page: &dyn crate::extract::ChannelPage,
    identifier: &ChannelIdentifier,
) -> Result<ChannelRecord, ScrapeError> {
    let about_url = identifier.about_url();
    let response = page.navigate(&about_url).await?;
    if let Some(status) = response.status.filter(|s| *s >= 400) {
        return Err(ScrapeError::HttpStatus {
            status,
            url: about_url,
        });
    }

    let record = ctx.extractor.extract(page, identifier).await?;
    if record.is_partial() && !ctx.settings.save_partial_results {
        return Err(ScrapeError::PartialResult {
            url: identifier.url.clone(),
        });
    }
    Ok(record)
}

async fn handle_success(
    ctx: &Arc<CrawlContext>,
    item: &WorkItem,
    mut record: ChannelRecord,
    latency: Duration,
) {
    ctx.rate.record_outcome(true, latency, false).await;
    record.processing_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);

    if let Err(e) = ctx.deps.sink.append(&record).await {
        // The page was fine; only the write failed, so no retry
        warn!("Failed to append record for {}: {e:#}", item.identifier.url);
        let error = format!("record append failed: {e:#}");
        record_terminal(ctx, item, ErrorCategory::Temporary, error).await;
        return;
    }

    ctx.counters.recorded.fetch_add(1, Ordering::SeqCst);
    info!(
        "Recorded {} ({}, {} subscribers, source {:?})",
        record.url, record.name, record.subscriber_count, record.extraction_source
    );

    if ctx.rate.success_rate().await >= ctx.rate.target_success_rate() {
        if let Some(permits) = ctx.grow_concurrency() {
            debug!("Concurrency raised to {permits}");
        }
    }
    finish(ctx);
}

async fn handle_failure(
    ctx: &Arc<CrawlContext>,
    item: WorkItem,
    session: &Session,
    error: ScrapeError,
    latency: Duration,
) {
    let category = classify_error(&error);
    ctx.rate
        .record_outcome(false, latency, category == ErrorCategory::RateLimit)
        .await;

    if error.requires_session_rotation() {
        warn!(
            "Retiring session {} after {}: {error}",
            session.id, item.identifier.url
        );
        ctx.deps.sessions.retire(session.id);
    }

    match retry_decision(category, item.attempt, ctx.settings.max_retries) {
        RetryDecision::Retry { delay } => {
            ctx.stats.increment_retry(category);
            info!(
                "Retrying {} in {}ms (retry {}, {category}): {error}",
                item.identifier.url,
                delay.as_millis(),
                item.attempt + 1
            );
            let next = WorkItem {
                identifier: item.identifier,
                attempt: item.attempt + 1,
            };
            ctx.queue.retry_after(next, delay);
        }
        RetryDecision::GiveUp => {
            warn!(
                "Giving up on {} after {} attempt(s) [{category}]: {error}",
                item.identifier.url,
                item.attempt + 1
            );
            record_terminal(ctx, &item, category, error.to_string()).await;
        }
    }
}

/// Logs a terminal failure and marks the identifier finished.
async fn record_terminal(
    ctx: &Arc<CrawlContext>,
    item: &WorkItem,
    category: ErrorCategory,
    error: String,
) {
    ctx.stats.increment_failure(category);
    ctx.counters.failed.fetch_add(1, Ordering::SeqCst);

    let failure = FailureRecord {
        url: item.identifier.url.clone(),
        category,
        attempts: item.attempt + 1,
        error,
        input_source: item.identifier.source,
        timestamp: Utc::now(),
    };
    if let Err(e) = ctx.deps.failures.record(&failure).await {
        warn!(
            "Failed to record failure for {}: {e:#}",
            item.identifier.url
        );
    }
    finish(ctx);
}

fn finish(ctx: &CrawlContext) {
    let processed = ctx.counters.processed.fetch_add(1, Ordering::SeqCst) + 1;
    ctx.queue.finish();
    if processed >= ctx.settings.max_processed
        && processed < ctx.total
        && !ctx.queue.is_stopped()
    {
        info!(
            "Reached the crawl cap of {} channels; finishing in-flight attempts",
            ctx.settings.max_processed
        );
        ctx.queue.stop();
    }
}
