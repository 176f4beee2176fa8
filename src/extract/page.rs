//! Page capability used by the extractor.
//!
//! The extractor never talks to a browser directly; it only needs these
//! operations. Element handles are returned as owned snapshots so callers never
//! hold references into the page across await points.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error_handling::ScrapeError;

/// Owned snapshot of an element: its rendered text and attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementSnapshot {
    /// Inner text, if any
    pub text: Option<String>,
    /// Attribute name to value
    pub attributes: HashMap<String, String>,
}

impl ElementSnapshot {
    /// Creates a snapshot with the given text and no attributes.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attributes: HashMap::new(),
        }
    }

    /// Adds an attribute (builder style).
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Looks up an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Trimmed, non-empty text.
    pub fn trimmed_text(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// A sub-frame embedded in the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameInfo {
    /// Frame `name` attribute
    pub name: String,
    /// Frame source URL
    pub url: String,
}

/// Result of a navigation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NavigationResponse {
    /// HTTP status of the main document, when the runtime exposes it
    pub status: Option<u16>,
}

/// The operations the extractor and the orchestrator need from a loaded page.
///
/// Query methods return `Ok(None)` (or an empty list) when nothing matches
/// within the timeout; `Err` is reserved for runtime failures.
#[async_trait]
pub trait ChannelPage: Send + Sync {
    /// Loads a URL into the page.
    async fn navigate(&self, url: &str) -> Result<NavigationResponse, ScrapeError>;

    /// Evaluates a script expression and returns its JSON value (`Null` if undefined).
    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError>;

    /// First element matching a CSS selector, waiting up to `timeout`.
    async fn query_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError>;

    /// All elements currently matching a CSS selector.
    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError>;

    /// First element matching a structural (XPath) query, waiting up to `timeout`.
    async fn query_structural(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError>;

    /// Full rendered markup.
    async fn content(&self) -> Result<String, ScrapeError>;

    /// Current URL (after redirects).
    async fn current_url(&self) -> Result<String, ScrapeError>;

    /// Full-page screenshot (PNG bytes).
    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError>;

    /// Sub-frames currently attached to the page.
    async fn frames(&self) -> Result<Vec<FrameInfo>, ScrapeError>;

    /// Clicks the first element matching a selector. Returns false if none matched.
    async fn click(&self, selector: &str) -> Result<bool, ScrapeError>;

    /// Releases the page.
    async fn close(&self);
}
