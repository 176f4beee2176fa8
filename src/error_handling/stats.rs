//! Processing statistics tracking.
//!
//! Thread-safe counters for terminal failures per category and for retries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::categorization::ErrorCategory;

/// Thread-safe processing statistics tracker.
///
/// Counts terminal failures and scheduled retries per [`ErrorCategory`]. Every
/// category is initialized to zero on creation, so lookups never miss.
///
/// # Thread Safety
///
/// This struct is thread-safe and can be shared across multiple tasks using `Arc`.
pub struct ProcessingStats {
    failures: HashMap<ErrorCategory, AtomicUsize>,
    retries: HashMap<ErrorCategory, AtomicUsize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        let mut retries = HashMap::new();
        for category in ErrorCategory::iter() {
            failures.insert(category, AtomicUsize::new(0));
            retries.insert(category, AtomicUsize::new(0));
        }
        ProcessingStats { failures, retries }
    }

    /// Increment the terminal failure counter for a category.
    pub fn increment_failure(&self, category: ErrorCategory) {
        if let Some(counter) = self.failures.get(&category) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment failure counter for {:?} which is not in the map",
                category
            );
        }
    }

    /// Increment the retry counter for a category.
    pub fn increment_retry(&self, category: ErrorCategory) {
        if let Some(counter) = self.retries.get(&category) {
            counter.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get_failure_count(&self, category: ErrorCategory) -> usize {
        self.failures
            .get(&category)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn get_retry_count(&self, category: ErrorCategory) -> usize {
        self.retries
            .get(&category)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    pub fn total_failures(&self) -> usize {
        self.failures.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }

    pub fn total_retries(&self) -> usize {
        self.retries.values().map(|c| c.load(Ordering::SeqCst)).sum()
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
