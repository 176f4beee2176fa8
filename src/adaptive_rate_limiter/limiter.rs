//! Adaptive delay controller implementation.

use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::window::{OutcomeWindow, RequestOutcome};

/// Tunables for the adaptive delay controller.
#[derive(Debug, Clone, Copy)]
pub struct RateSettings {
    /// Lower bound (and starting value) of the inter-request delay
    pub min_delay: Duration,
    /// Upper bound of the inter-request delay
    pub max_delay: Duration,
    /// Number of recent outcomes considered
    pub window_size: usize,
    /// Success rate at or above which the delay relaxes
    pub target_success_rate: f64,
    /// Relative step used when tightening (×(1+r)) or relaxing (×(1−r/2))
    pub adaptation_rate: f64,
    /// Average latency above which the delay is stretched by 10%
    pub latency_threshold: Duration,
    /// Symmetric jitter applied by `next_delay`, as a fraction
    pub jitter: f64,
}

impl Default for RateSettings {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(1_000),
            max_delay: Duration::from_millis(15_000),
            window_size: 20,
            target_success_rate: 0.95,
            adaptation_rate: 0.1,
            latency_threshold: Duration::from_secs(5),
            jitter: 0.1,
        }
    }
}

struct RateState {
    window: OutcomeWindow,
    current_delay: Duration,
    last_dispatch: Option<Instant>,
}

/// Adaptive rate controller that adjusts the inter-request delay from observed outcomes.
///
/// - Rate-limited outcome: delay doubles (clamped to max)
/// - Success rate below target: delay grows by the adaptation rate
/// - Success rate at/above target: delay shrinks by half the adaptation rate
/// - Slow responses (average latency above threshold): delay grows by 10%
///
/// One instance is shared by all workers; state lives behind a single mutex.
pub struct AdaptiveRateLimiter {
    settings: RateSettings,
    state: Mutex<RateState>,
}

impl AdaptiveRateLimiter {
    /// Creates a new controller starting at the minimum delay.
    ///
    /// # Arguments
    ///
    /// * `settings` - Delay bounds and adaptation tunables; a max below min is raised to min
    pub fn new(mut settings: RateSettings) -> Self {
        if settings.max_delay < settings.min_delay {
            log::warn!(
                "Rate max delay {:?} is below min delay {:?}; using min for both",
                settings.max_delay,
                settings.min_delay
            );
            settings.max_delay = settings.min_delay;
        }
        AdaptiveRateLimiter {
            state: Mutex::new(RateState {
                window: OutcomeWindow::new(settings.window_size),
                current_delay: settings.min_delay,
                last_dispatch: None,
            }),
            settings,
        }
    }

    /// Records the outcome of one attempt and adapts the current delay.
    ///
    /// # Arguments
    ///
    /// * `success` - Whether the attempt produced a record
    /// * `latency` - Wall-clock time of the attempt
    /// * `rate_limited` - Whether the failure was classified as rate limiting
    pub async fn record_outcome(&self, success: bool, latency: Duration, rate_limited: bool) {
        let s = &self.settings;
        let mut state = self.state.lock().await;
        state.window.record(RequestOutcome {
            success,
            latency,
            rate_limited,
        });

        let previous = state.current_delay;
        let mut delay = previous.as_secs_f64();
        if rate_limited {
            delay *= 2.0;
        } else {
            let success_rate = state.window.success_rate();
            if success_rate < s.target_success_rate {
                delay *= 1.0 + s.adaptation_rate;
            } else if previous > s.min_delay {
                delay *= 1.0 - s.adaptation_rate / 2.0;
            }
        }
        if state.window.average_latency() > s.latency_threshold {
            delay *= 1.1;
        }

        let delay = delay.clamp(s.min_delay.as_secs_f64(), s.max_delay.as_secs_f64());
        state.current_delay = Duration::from_secs_f64(delay);

        if state.current_delay != previous {
            log::debug!(
                "Adaptive delay: {}ms -> {}ms (success rate {:.1}%, window {})",
                previous.as_millis(),
                state.current_delay.as_millis(),
                state.window.success_rate() * 100.0,
                state.window.len()
            );
        }
    }

    /// Waits until the caller may dispatch its next request.
    ///
    /// The slot is reserved under the lock (last dispatch + jittered delay) and the
    /// wait happens after releasing it, so concurrent callers are spaced one
    /// interval apart instead of all firing at once.
    ///
    /// # Returns
    ///
    /// The time actually waited.
    pub async fn next_delay(&self) -> Duration {
        let dispatch_at = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let jittered = self.jittered(state.current_delay);
            let at = match state.last_dispatch {
                Some(last) => (last + jittered).max(now),
                None => now,
            };
            state.last_dispatch = Some(at);
            at
        };
        let wait = dispatch_at.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            tokio::time::sleep_until(dispatch_at).await;
        }
        wait
    }

    /// Current un-jittered delay.
    pub async fn current_delay(&self) -> Duration {
        self.state.lock().await.current_delay
    }

    /// Success rate over the rolling window.
    pub async fn success_rate(&self) -> f64 {
        self.state.lock().await.window.success_rate()
    }

    /// Target success rate from the settings.
    pub fn target_success_rate(&self) -> f64 {
        self.settings.target_success_rate
    }

    fn jittered(&self, delay: Duration) -> Duration {
        let j = self.settings.jitter.abs();
        if j == 0.0 {
            return delay;
        }
        let factor = rand::rng().random_range((1.0 - j)..=(1.0 + j));
        Duration::from_secs_f64(delay.as_secs_f64() * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(min_ms: u64, max_ms: u64) -> AdaptiveRateLimiter {
        AdaptiveRateLimiter::new(RateSettings {
            min_delay: Duration::from_millis(min_ms),
            max_delay: Duration::from_millis(max_ms),
            ..RateSettings::default()
        })
    }

    #[tokio::test]
    async fn test_starts_at_min() {
        let l = limiter(1000, 15000);
        assert_eq!(l.current_delay().await, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_rate_limited_drives_to_max_monotonically() {
        let l = limiter(1000, 5000);
        let mut previous = l.current_delay().await;
        for _ in 0..3 {
            l.record_outcome(false, Duration::ZERO, true).await;
            let current = l.current_delay().await;
            assert!(current >= previous);
            previous = current;
        }
        assert_eq!(previous, Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn test_rate_limited_doubles() {
        let l = limiter(1000, 15000);
        l.record_outcome(false, Duration::ZERO, true).await;
        assert_eq!(l.current_delay().await, Duration::from_millis(2000));
        l.record_outcome(false, Duration::ZERO, true).await;
        assert_eq!(l.current_delay().await, Duration::from_millis(4000));
    }

    #[tokio::test]
    async fn test_failures_below_target_tighten() {
        let l = limiter(1000, 15000);
        l.record_outcome(false, Duration::ZERO, false).await;
        assert_eq!(l.current_delay().await, Duration::from_millis(1100));
    }

    #[tokio::test]
    async fn test_successes_relax_towards_min() {
        let l = limiter(1000, 15000);
        l.record_outcome(false, Duration::ZERO, true).await; // 2000ms
        // Window now 1 failure; enough successes push the rate to >= 0.95
        for _ in 0..19 {
            l.record_outcome(true, Duration::ZERO, false).await;
        }
        let after_recovery = l.current_delay().await;
        l.record_outcome(true, Duration::ZERO, false).await;
        let relaxed = l.current_delay().await;
        assert!(relaxed < after_recovery || relaxed == Duration::from_millis(1000));
        assert!(relaxed >= Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_success_at_min_stays_at_min() {
        let l = limiter(1000, 15000);
        l.record_outcome(true, Duration::ZERO, false).await;
        assert_eq!(l.current_delay().await, Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_slow_latency_stretches_delay() {
        let l = limiter(1000, 15000);
        // Success at min would not move; latency alone adds 10%
        l.record_outcome(true, Duration::from_secs(8), false).await;
        assert_eq!(l.current_delay().await, Duration::from_millis(1100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_delay_spaces_dispatches() {
        let l = AdaptiveRateLimiter::new(RateSettings {
            min_delay: Duration::from_millis(1000),
            jitter: 0.0,
            ..RateSettings::default()
        });
        // First dispatch is immediate
        assert_eq!(l.next_delay().await, Duration::ZERO);
        let waited = l.next_delay().await;
        assert_eq!(waited, Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_delay_jitter_bounds() {
        let l = limiter(1000, 15000);
        l.next_delay().await;
        for _ in 0..20 {
            let waited = l.next_delay().await;
            assert!(waited >= Duration::from_millis(899), "waited {:?}", waited);
            assert!(waited <= Duration::from_millis(1101), "waited {:?}", waited);
        }
    }
}
