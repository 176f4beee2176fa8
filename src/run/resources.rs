//! Crawl resources and state.
//!
//! This module defines the collaborators, settings and shared state a crawl
//! runs with.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::adaptive_rate_limiter::{AdaptiveRateLimiter, RateSettings};
use crate::browser::{Browser, SessionPool};
use crate::config::Config;
use crate::error_handling::{ErrorCategory, ProcessingStats};
use crate::extract::{ChannelExtractor, ExtractorSettings, DOM_LAYER_BUDGET};
use crate::initialization::init_semaphore;
use crate::storage::{FailureSink, RecordSink};

use super::queue::WorkQueue;

/// External collaborators of a crawl.
#[derive(Clone)]
pub struct CrawlDeps {
    /// Page loader
    pub browser: Arc<dyn Browser>,
    /// Destination for records
    pub sink: Arc<dyn RecordSink>,
    /// Destination for terminal failures
    pub failures: Arc<dyn FailureSink>,
    /// Network identities
    pub sessions: Arc<SessionPool>,
}

/// Tunables of a crawl, usually derived from a validated [`Config`].
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    /// Wall-clock budget of one attempt (navigation and extraction)
    pub attempt_timeout: Duration,
    /// Cap on every category's retry budget
    pub max_retries: u32,
    /// Concurrent attempts allowed at start
    pub min_concurrency: usize,
    /// Concurrent attempts allowed once the success rate holds
    pub max_concurrency: usize,
    /// Stop dequeuing once this many identifiers are finished
    pub max_processed: usize,
    /// Keep records whose name could not be extracted
    pub save_partial_results: bool,
    /// Pacing controller tunables
    pub rate: RateSettings,
    /// Extractor tunables
    pub extractor: ExtractorSettings,
}

impl CrawlSettings {
    pub fn from_config(config: &Config) -> Self {
        let attempt_timeout = config.attempt_timeout();
        Self {
            attempt_timeout,
            max_retries: config.max_retries,
            min_concurrency: config.min_concurrency.max(1),
            max_concurrency: config.max_concurrency.max(config.min_concurrency).max(1),
            max_processed: config.max_identifiers,
            save_partial_results: config.save_partial_results,
            rate: RateSettings {
                min_delay: Duration::from_millis(config.rate_min_delay_ms),
                max_delay: Duration::from_millis(config.rate_max_delay_ms),
                ..RateSettings::default()
            },
            extractor: ExtractorSettings {
                // Navigation and hygiene need the rest of the attempt
                dom_budget: DOM_LAYER_BUDGET.min(attempt_timeout / 3),
                snapshot_dir: config.snapshot_dir.clone(),
                ..ExtractorSettings::default()
            },
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Results of a crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    /// Identifiers handed to the crawl
    pub total: usize,
    /// Identifiers finished (recorded or failed for good)
    pub processed: usize,
    /// Records appended to the sink
    pub recorded: usize,
    /// Terminal failures
    pub failed: usize,
    /// Retries scheduled across all identifiers
    pub retries: usize,
    /// Terminal failures per category, in category order, zero counts omitted
    pub failures_by_category: Vec<(ErrorCategory, usize)>,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
    /// Pacing delay the rate controller had settled on when the crawl ended
    pub final_delay_ms: u64,
    /// Record file, when the crawl wrote to one
    pub output: Option<PathBuf>,
    /// Failure log, when the crawl wrote to one
    pub failed_log: Option<PathBuf>,
}

impl CrawlReport {
    /// Share of processed identifiers that produced a record.
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.recorded as f64 / self.processed as f64
        }
    }
}

/// Progress counters shared with the logging task.
#[derive(Debug, Default)]
pub(crate) struct CrawlCounters {
    pub(crate) processed: AtomicUsize,
    pub(crate) recorded: AtomicUsize,
    pub(crate) failed: AtomicUsize,
}

/// State shared by all workers of one crawl.
pub(crate) struct CrawlContext {
    pub(crate) deps: CrawlDeps,
    pub(crate) settings: CrawlSettings,
    pub(crate) extractor: ChannelExtractor,
    pub(crate) rate: AdaptiveRateLimiter,
    pub(crate) stats: ProcessingStats,
    pub(crate) queue: Arc<WorkQueue>,
    pub(crate) counters: Arc<CrawlCounters>,
    /// Gates concurrent attempts; starts at `min_concurrency` permits
    pub(crate) semaphore: Arc<Semaphore>,
    /// Permits handed out so far
    granted: AtomicUsize,
    pub(crate) total: usize,
}

impl CrawlContext {
    pub(crate) fn new(
        deps: CrawlDeps,
        settings: CrawlSettings,
        queue: Arc<WorkQueue>,
        total: usize,
    ) -> Self {
        Self {
            extractor: ChannelExtractor::new(settings.extractor.clone()),
            rate: AdaptiveRateLimiter::new(settings.rate),
            stats: ProcessingStats::new(),
            counters: Arc::new(CrawlCounters::default()),
            semaphore: init_semaphore(settings.min_concurrency),
            granted: AtomicUsize::new(settings.min_concurrency),
            deps,
            settings,
            queue,
            total,
        }
    }

    /// Adds one concurrency permit, up to `max_concurrency`.
    ///
    /// Returns the new permit count, or `None` when already at the maximum.
    pub(crate) fn grow_concurrency(&self) -> Option<usize> {
        let max = self.settings.max_concurrency;
        let previous = self
            .granted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |g| (g < max).then_some(g + 1))
            .ok()?;
        self.semaphore.add_permits(1);
        Some(previous + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_follow_config() {
        let config = Config {
            attempt_timeout_secs: 12,
            max_retries: 2,
            min_concurrency: 2,
            max_concurrency: 4,
            rate_min_delay_ms: 250,
            rate_max_delay_ms: 500,
            save_partial_results: false,
            ..Default::default()
        };
        let settings = CrawlSettings::from_config(&config);
        assert_eq!(settings.attempt_timeout, Duration::from_secs(12));
        assert_eq!(settings.max_retries, 2);
        assert_eq!(settings.min_concurrency, 2);
        assert_eq!(settings.max_concurrency, 4);
        assert_eq!(settings.rate.min_delay, Duration::from_millis(250));
        assert_eq!(settings.rate.max_delay, Duration::from_millis(500));
        assert_eq!(settings.extractor.dom_budget, Duration::from_secs(4));
        assert!(!settings.save_partial_results);
    }

    #[test]
    fn test_success_rate() {
        let report = CrawlReport {
            processed: 4,
            recorded: 3,
            failed: 1,
            ..Default::default()
        };
        assert!((report.success_rate() - 0.75).abs() < f64::EPSILON);
    }
}
