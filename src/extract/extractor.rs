//! Layered-fallback channel extraction.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{debug, error, warn};
use serde_json::Value;

use super::dom::{self, DomProbe, LookupBudget};
use super::hygiene::{check_captcha, dismiss_consent};
use super::markup::social_links_from_markup;
use super::page::ChannelPage;
use super::record::{ChannelRecord, SourceTally, UNKNOWN_CHANNEL_NAME};
use super::structured::{read_structured_fields, text_of, StructuredFields, INITIAL_DATA_SCRIPT};
use super::verification::detect_verification;
use crate::error_handling::ScrapeError;
use crate::input::ChannelIdentifier;
use crate::parse::{categorize, extract_contact_info, parse_compact_count};

/// Default render wait granted to the first DOM lookup.
pub const DOM_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Default wall-clock cap for all DOM probes of one extraction.
pub const DOM_LAYER_BUDGET: Duration = Duration::from_secs(10);

/// Extractor settings.
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    /// Render wait for the first DOM probe; later probes wait much less
    pub dom_timeout: Duration,
    /// Cap on the whole DOM layer, kept well under the attempt timeout
    pub dom_budget: Duration,
    /// Where diagnostic snapshots go; `None` disables writing them
    pub snapshot_dir: Option<PathBuf>,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            dom_timeout: DOM_QUERY_TIMEOUT,
            dom_budget: DOM_LAYER_BUDGET,
            snapshot_dir: None,
        }
    }
}

/// Extracts a [`ChannelRecord`] from a loaded about page.
///
/// Each field is taken from the first layer that yields it: the structured data
/// object, then DOM probes, then (links only) a regex over the raw markup.
/// Missing fields degrade to empty values; only hygiene failures, runtime errors
/// and unknown count multipliers fail the extraction.
pub struct ChannelExtractor {
    settings: ExtractorSettings,
}

impl ChannelExtractor {
    pub fn new(settings: ExtractorSettings) -> Self {
        Self { settings }
    }

    /// Runs the extraction, requesting a diagnostic snapshot on failure.
    ///
    /// # Arguments
    ///
    /// * `page` - Page already navigated to the channel's about URL
    /// * `identifier` - Channel being extracted
    ///
    /// # Errors
    ///
    /// Returns the extraction error after the snapshot attempt. Snapshot
    /// failures are logged and never replace the original error.
    pub async fn extract(
        &self,
        page: &dyn ChannelPage,
        identifier: &ChannelIdentifier,
    ) -> Result<ChannelRecord, ScrapeError> {
        let started = Instant::now();
        match self.extract_layers(page, identifier, started).await {
            Ok(record) => Ok(record),
            Err(e) => {
                self.capture_snapshot(page, identifier, &e).await;
                Err(e)
            }
        }
    }

    async fn extract_layers(
        &self,
        page: &dyn ChannelPage,
        identifier: &ChannelIdentifier,
        started: Instant,
    ) -> Result<ChannelRecord, ScrapeError> {
        dismiss_consent(page).await?;
        check_captcha(page).await?;

        let structured = self.read_structured(page).await;
        let mut tally = SourceTally::default();
        let budget = LookupBudget::new(self.settings.dom_timeout, self.settings.dom_budget);

        let name = match structured.name.as_ref().and_then(text_of) {
            Some(name) => {
                tally.structured += 1;
                name
            }
            None => match dom::first_value(page, dom::NAME, &budget).await {
                Some(name) => {
                    tally.dom += 1;
                    name
                }
                None => UNKNOWN_CHANNEL_NAME.to_string(),
            },
        };

        let subscribers = self
            .field(page, structured.subscribers, dom::SUBSCRIBERS, &budget, &mut tally)
            .await;
        let videos = self.field(page, structured.videos, dom::VIDEOS, &budget, &mut tally).await;
        let views = self.field(page, structured.views, dom::VIEWS, &budget, &mut tally).await;
        let description = self
            .field(page, structured.description, dom::DESCRIPTION, &budget, &mut tally)
            .await;
        let location = self
            .field(page, structured.location, dom::LOCATION, &budget, &mut tally)
            .await;
        let joined = self.field(page, structured.joined, dom::JOINED, &budget, &mut tally).await;
        let avatar = self.field(page, structured.avatar, dom::AVATAR, &budget, &mut tally).await;

        let raw_links = if !structured.links.is_empty() {
            tally.structured += 1;
            structured.links.clone()
        } else {
            let dom_links = dom::outbound_links(page).await;
            if !dom_links.is_empty() {
                tally.dom += 1;
                dom_links
            } else {
                let markup = page.content().await.unwrap_or_default();
                let found = social_links_from_markup(&markup);
                if !found.is_empty() {
                    tally.markup += 1;
                }
                found
            }
        };

        let contact = extract_contact_info(Some(&description));
        let verification = detect_verification(page, &structured.badges, &budget).await;

        Ok(ChannelRecord {
            url: identifier.url.clone(),
            name,
            subscriber_count: parse_compact_count(&subscribers)?,
            video_count: parse_compact_count(&videos)?,
            view_count: parse_compact_count(&views)?,
            joined_date: joined,
            location,
            description,
            avatar_url: avatar,
            emails: contact.emails,
            phones: contact.phones,
            links: categorize(&raw_links),
            verification,
            extraction_source: tally.dominant(),
            input_source: identifier.source,
            input_origin: identifier.origin.clone(),
            scraped_at: Utc::now(),
            processing_ms: started.elapsed().as_millis() as u64,
        })
    }

    /// Reads the bootstrap object. Any failure means "layer unavailable".
    async fn read_structured(&self, page: &dyn ChannelPage) -> StructuredFields {
        match page.evaluate(INITIAL_DATA_SCRIPT).await {
            Ok(value @ Value::Object(_)) => read_structured_fields(&value),
            Ok(_) => {
                debug!("Structured data object not present");
                StructuredFields::default()
            }
            Err(e) => {
                debug!("Structured data object unreadable: {}", e);
                StructuredFields::default()
            }
        }
    }

    /// Structured value if present, else the first DOM probe hit, else "".
    async fn field(
        &self,
        page: &dyn ChannelPage,
        structured: Option<String>,
        probes: &[DomProbe],
        budget: &LookupBudget,
        tally: &mut SourceTally,
    ) -> String {
        if let Some(value) = structured {
            tally.structured += 1;
            return value;
        }
        match dom::first_value(page, probes, budget).await {
            Some(value) => {
                tally.dom += 1;
                value
            }
            None => String::new(),
        }
    }

    /// Logs the failure under a fresh error id and, when a snapshot dir is
    /// configured, writes the page screenshot and markup under that id.
    pub async fn capture_snapshot(
        &self,
        page: &dyn ChannelPage,
        identifier: &ChannelIdentifier,
        err: &ScrapeError,
    ) {
        let error_id = uuid::Uuid::new_v4().to_string();
        error!(
            "Extraction failed for {} (error id {}): {}",
            identifier.url, error_id, err
        );
        let Some(dir) = &self.settings.snapshot_dir else {
            return;
        };
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!("Cannot create snapshot dir {}: {}", dir.display(), e);
            return;
        }

        match page.screenshot().await {
            Ok(png) => {
                let path = dir.join(format!("{error_id}.png"));
                if let Err(e) = tokio::fs::write(&path, png).await {
                    warn!("Failed to write snapshot {}: {}", path.display(), e);
                }
            }
            Err(e) => debug!("Screenshot unavailable for {}: {}", error_id, e),
        }
        match page.content().await {
            Ok(html) => {
                let path = dir.join(format!("{error_id}.html"));
                if let Err(e) = tokio::fs::write(&path, html).await {
                    warn!("Failed to write snapshot {}: {}", path.display(), e);
                }
            }
            Err(e) => debug!("Markup unavailable for {}: {}", error_id, e),
        }
    }
}
