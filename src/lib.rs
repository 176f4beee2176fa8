//! channel_scout library: YouTube channel "about" extraction
//!
//! This library crawls channel about pages and extracts profile metadata:
//! display name, subscriber/video/view counts, joined date, location,
//! description, contact emails and phones, categorized outbound links and the
//! verification badge. Channels come from direct URLs, bulk import files and
//! keyword searches; records are appended to a JSON Lines file.
//!
//! # Example
//!
//! ```no_run
//! use channel_scout::{run_crawl, Config};
//! use tokio;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     urls: vec!["@SomeHandle".to_string()],
//!     keywords: vec!["woodworking".to_string()],
//!     max_concurrency: 3,
//!     ..Default::default()
//! };
//!
//! let report = run_crawl(config).await?;
//! println!("Processed {} channels: {} recorded, {} failed",
//!          report.processed, report.recorded, report.failed);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod adaptive_rate_limiter;
mod app;
pub mod browser;
pub mod config;
pub mod error_handling;
pub mod extract;
pub mod initialization;
pub mod input;
pub mod parse;
pub mod run;
pub mod storage;
mod utils;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel};
pub use run::{crawl, run_crawl, CrawlDeps, CrawlReport, CrawlSettings};
