//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, option ranges, intervals)
//! - The library `Config` with clamping and validation
//! - CLI option parsing and the JSON input file

mod constants;
mod opt;
mod types;

// Re-export all constants
pub use constants::*;
pub use opt::{InputFile, Opt};
pub use types::{clamp_option, BrowserKind, Config, LogFormat, LogLevel};
