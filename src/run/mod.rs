//! Crawl orchestration.
//!
//! Identifiers flow through a shared work queue to a pool of workers. Each
//! worker takes a concurrency permit, waits for its pacing slot, runs one
//! attempt under the attempt timeout and routes failures through the retry
//! policy. Retries go back on the queue once their backoff elapses.

mod finalize;
mod init;
mod queue;
mod resources;
mod task;

use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use tokio_util::sync::CancellationToken;

use crate::app::log_progress;
use crate::config::LOGGING_INTERVAL;
use crate::input::ChannelIdentifier;

use self::finalize::finalize_crawl;
use self::queue::WorkQueue;
use self::resources::{CrawlContext, CrawlCounters};
use self::task::process_item;

// Re-export public API
pub use init::run_crawl;
pub use resources::{CrawlDeps, CrawlReport, CrawlSettings};

/// Crawls the given identifiers with caller-supplied collaborators.
///
/// This is the lower-level entry point behind [`run_crawl`]; it skips input
/// gathering and file setup, which makes it suitable for embedding with
/// custom browsers and sinks.
///
/// # Arguments
///
/// * `identifiers` - Normalized channel identifiers, in processing order
/// * `deps` - Page loader, sinks and session pool
/// * `settings` - Timeouts, retry cap, concurrency bounds and pacing
///
/// # Returns
///
/// A [`CrawlReport`]. Individual channel failures are counted, never returned.
pub async fn crawl(
    identifiers: Vec<ChannelIdentifier>,
    deps: CrawlDeps,
    settings: CrawlSettings,
) -> CrawlReport {
    let start_time = Instant::now();
    let total = identifiers.len();
    info!(
        "Crawling {} channel(s) with concurrency {}..{} over {} session(s)",
        total,
        settings.min_concurrency,
        settings.max_concurrency,
        deps.sessions.len()
    );

    let queue = Arc::new(WorkQueue::new(identifiers, CancellationToken::new()));
    let workers_count = settings.max_concurrency;
    let ctx = Arc::new(CrawlContext::new(deps, settings, queue, total));

    let cancel = CancellationToken::new();
    let logging_task = spawn_progress_logger(
        cancel.child_token(),
        start_time,
        Arc::clone(&ctx.counters),
        total,
    );

    let mut workers = FuturesUnordered::new();
    for _ in 0..workers_count {
        workers.push(tokio::spawn(worker(Arc::clone(&ctx))));
    }
    while let Some(worker_result) = workers.next().await {
        if let Err(join_error) = worker_result {
            warn!("Worker panicked: {:?}", join_error);
        }
    }

    finalize_crawl(ctx, start_time, cancel, Some(logging_task)).await
}

/// Pulls items until the queue drains or stops.
///
/// A permit is held for the whole attempt, so at most as many attempts run
/// as permits have been granted.
async fn worker(ctx: Arc<CrawlContext>) {
    loop {
        let Ok(permit) = Arc::clone(&ctx.semaphore).acquire_owned().await else {
            break;
        };
        let Some(item) = ctx.queue.next().await else {
            break;
        };
        process_item(&ctx, item).await;
        drop(permit);
    }
}

fn spawn_progress_logger(
    cancel: CancellationToken,
    start_time: Instant,
    counters: Arc<CrawlCounters>,
    total: usize,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(async move {
        let mut interval = tokio::time::interval(LOGGING_INTERVAL);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    log_progress(start_time, &counters.processed, &counters.recorded, total);
                }
                _ = cancel.cancelled() => {
                    break;
                }
            }
        }
    })
}
