//! Crawl resource initialization.
//!
//! This module contains the setup that happens before the crawl loop starts:
//! configuration validation, input gathering and collaborator construction.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

#[cfg(feature = "browser")]
use crate::browser::ChromiumBrowser;
use crate::browser::{Browser, HttpBrowser, SessionPool};
use crate::config::{BrowserKind, Config};
use crate::initialization::init_client;
use crate::input::{
    apply_resume_marker, collect_keyword_results, normalize, read_bulk_file, ChannelIdentifier,
    InputSources, YoutubeSearch,
};
use crate::storage::{JsonlFailureSink, JsonlSink};

use super::resources::{CrawlDeps, CrawlReport, CrawlSettings};

/// Runs a channel crawl with the provided configuration.
///
/// This is the main entry point for the library. It validates the
/// configuration, gathers identifiers from direct URLs, the bulk import file
/// and keyword searches, then crawls them and appends records to the output
/// file and terminal failures to the failure log.
///
/// # Arguments
///
/// * `config` - Crawl configuration; numeric options are clamped into range
///
/// # Returns
///
/// A [`CrawlReport`] with final counts.
///
/// # Errors
///
/// This function will return an error if:
/// - The configuration is unusable (no input, missing required proxy)
/// - The bulk import file cannot be read or has an unsupported format
/// - The page loader cannot be started
/// - The output or failure log cannot be opened
///
/// Individual channel failures never fail the run.
///
/// # Example
///
/// ```no_run
/// use channel_scout::{run_crawl, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config {
///     urls: vec!["@SomeHandle".to_string()],
///     ..Default::default()
/// };
/// let report = run_crawl(config).await?;
/// println!("Recorded {} channels", report.recorded);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(mut config: Config) -> Result<CrawlReport> {
    config
        .validate()
        .context("Configuration validation failed")?;

    let identifiers = load_identifiers(&config).await?;

    let sessions = Arc::new(SessionPool::new(&config.proxies));
    let browser = init_browser(&config, &sessions).await?;
    let sink = JsonlSink::open(&config.output)
        .await
        .context("Failed to open output file")?;
    let failures = JsonlFailureSink::open(&config.failed_log)
        .await
        .context("Failed to open failure log")?;
    info!(
        "Writing records to {} and failures to {}",
        config.output.display(),
        config.failed_log.display()
    );

    let deps = CrawlDeps {
        browser,
        sink: Arc::new(sink),
        failures: Arc::new(failures),
        sessions,
    };
    let mut report = super::crawl(identifiers, deps, CrawlSettings::from_config(&config)).await;
    report.output = Some(config.output.clone());
    report.failed_log = Some(config.failed_log.clone());
    Ok(report)
}

/// Gathers and normalizes identifiers from every configured source.
async fn load_identifiers(config: &Config) -> Result<Vec<ChannelIdentifier>> {
    let bulk_records = match &config.bulk_file {
        Some(path) => read_bulk_file(path)
            .await
            .context("Failed to read bulk import file")?,
        None => Vec::new(),
    };

    let keyword_results = if config.keywords.iter().any(|k| !k.trim().is_empty()) {
        let client = init_client(config, config.proxies.first().map(String::as_str))
            .context("Failed to initialize search client")?;
        let search = YoutubeSearch::new(client);
        collect_keyword_results(&search, &config.keywords, config.results_per_keyword).await
    } else {
        Vec::new()
    };

    let sources = InputSources {
        direct_urls: config.urls.clone(),
        bulk_records,
        keyword_results,
    };
    let identifiers = normalize(&sources, config.max_identifiers)
        .context("Configuration validation failed")?;
    Ok(apply_resume_marker(
        identifiers,
        config.resume_from.as_deref(),
    ))
}

async fn init_browser(config: &Config, sessions: &SessionPool) -> Result<Arc<dyn Browser>> {
    match config.browser {
        BrowserKind::Http => {
            let browser =
                HttpBrowser::new(config, sessions).context("Failed to initialize HTTP loader")?;
            Ok(Arc::new(browser))
        }
        #[cfg(feature = "browser")]
        BrowserKind::Chromium => {
            let browser = ChromiumBrowser::launch(config, sessions)
                .await
                .context("Failed to launch Chromium")?;
            Ok(Arc::new(browser))
        }
        #[cfg(not(feature = "browser"))]
        BrowserKind::Chromium => {
            anyhow::bail!("the chromium loader requires building with the `browser` feature")
        }
    }
}
