//! Rolling window of recent request outcomes.

use std::collections::VecDeque;
use std::time::Duration;

/// Outcome of one crawl attempt as seen by the rate controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct RequestOutcome {
    pub(crate) success: bool,
    pub(crate) latency: Duration,
    pub(crate) rate_limited: bool,
}

/// Fixed-size window over the most recent outcomes.
///
/// Not synchronized on its own; the limiter owns it behind its state mutex.
pub(crate) struct OutcomeWindow {
    outcomes: VecDeque<RequestOutcome>,
    window_size: usize,
}

impl OutcomeWindow {
    pub(crate) fn new(window_size: usize) -> Self {
        let window_size = window_size.max(1);
        OutcomeWindow {
            outcomes: VecDeque::with_capacity(window_size),
            window_size,
        }
    }

    /// Records an outcome, evicting the oldest once the window is full.
    pub(crate) fn record(&mut self, outcome: RequestOutcome) {
        self.outcomes.push_back(outcome);
        while self.outcomes.len() > self.window_size {
            self.outcomes.pop_front();
        }
    }

    /// Fraction of successful outcomes in the window.
    /// An empty window counts as fully successful.
    pub(crate) fn success_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            return 1.0;
        }
        let successes = self.outcomes.iter().filter(|o| o.success).count();
        successes as f64 / self.outcomes.len() as f64
    }

    /// Mean latency over the window, zero when empty.
    pub(crate) fn average_latency(&self) -> Duration {
        if self.outcomes.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.outcomes.iter().map(|o| o.latency).sum();
        total / self.outcomes.len() as u32
    }

    pub(crate) fn len(&self) -> usize {
        self.outcomes.len()
    }
}
