//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `channel_scout` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use channel_scout::config::Opt;
use channel_scout::initialization::init_logger_with;
use channel_scout::run_crawl;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // This allows setting CHANNEL_SCOUT_PROXY_URLS in .env without exporting it manually
    if dotenvy::dotenv().is_err() {
        // If .env not found in current dir, try next to the executable
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    // Initialize logger before reading the input file so clamping warnings show
    let log_level = opt.log_level.clone();
    let log_format = opt.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let config = match opt.into_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("channel_scout error: {e}");
            process::exit(1);
        }
    };

    match run_crawl(config).await {
        Ok(report) => {
            println!(
                "✅ Processed {} channel{} ({} recorded, {} failed) in {:.1}s",
                report.processed,
                if report.processed == 1 { "" } else { "s" },
                report.recorded,
                report.failed,
                report.elapsed_seconds
            );
            if let Some(output) = &report.output {
                println!("Records saved in {}", output.display());
            }
            if report.failed > 0 {
                if let Some(failed_log) = &report.failed_log {
                    println!("Failures logged in {}", failed_log.display());
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("channel_scout error: {:#}", e);
            process::exit(1);
        }
    }
}
