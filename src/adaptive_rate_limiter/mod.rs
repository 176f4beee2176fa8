//! Adaptive request pacing.
//!
//! Tracks the last N attempt outcomes and derives the inter-request delay from
//! them: rate limiting and failures slow the crawl down, sustained success speeds
//! it back up towards the minimum delay.

mod limiter;
mod window;

pub use limiter::{AdaptiveRateLimiter, RateSettings};
