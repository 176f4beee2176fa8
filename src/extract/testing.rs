//! In-memory page stub for extractor unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::page::{ChannelPage, ElementSnapshot, FrameInfo, NavigationResponse};
use crate::error_handling::ScrapeError;

/// Page whose answers are registered up front, keyed by exact query string.
#[derive(Default)]
pub struct StubPage {
    url: Mutex<String>,
    status: Option<u16>,
    scripts: HashMap<String, Value>,
    elements: HashMap<String, ElementSnapshot>,
    element_lists: HashMap<String, Vec<ElementSnapshot>>,
    structural: HashMap<String, ElementSnapshot>,
    frames: Vec<FrameInfo>,
    clickable: HashSet<String>,
    markup: String,
    slow_misses: bool,
    pub screenshots: AtomicUsize,
}

impl StubPage {
    pub fn new(url: &str) -> Self {
        Self {
            url: Mutex::new(url.to_string()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_script(mut self, script: &str, value: Value) -> Self {
        self.scripts.insert(script.to_string(), value);
        self
    }

    pub fn with_element(mut self, selector: &str, element: ElementSnapshot) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }

    pub fn with_elements(mut self, selector: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.element_lists.insert(selector.to_string(), elements);
        self
    }

    pub fn with_structural(mut self, path: &str, element: ElementSnapshot) -> Self {
        self.structural.insert(path.to_string(), element);
        self
    }

    pub fn with_frame(mut self, frame: FrameInfo) -> Self {
        self.frames.push(frame);
        self
    }

    pub fn with_clickable(mut self, selector: &str) -> Self {
        self.clickable.insert(selector.to_string());
        self
    }

    pub fn with_markup(mut self, markup: &str) -> Self {
        self.markup = markup.to_string();
        self
    }

    /// Single-element queries that miss sleep out their whole timeout.
    pub fn with_slow_misses(mut self) -> Self {
        self.slow_misses = true;
        self
    }

    async fn answer(
        &self,
        found: Option<&ElementSnapshot>,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        if found.is_none() && self.slow_misses {
            tokio::time::sleep(timeout).await;
        }
        Ok(found.cloned())
    }
}

#[async_trait]
impl ChannelPage for StubPage {
    async fn navigate(&self, url: &str) -> Result<NavigationResponse, ScrapeError> {
        if let Ok(mut current) = self.url.lock() {
            *current = url.to_string();
        }
        Ok(NavigationResponse { status: self.status })
    }

    async fn evaluate(&self, script: &str) -> Result<Value, ScrapeError> {
        Ok(self.scripts.get(script).cloned().unwrap_or(Value::Null))
    }

    async fn query_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        self.answer(self.elements.get(selector), timeout).await
    }

    async fn query_selector_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>, ScrapeError> {
        Ok(self.element_lists.get(selector).cloned().unwrap_or_default())
    }

    async fn query_structural(
        &self,
        path: &str,
        timeout: Duration,
    ) -> Result<Option<ElementSnapshot>, ScrapeError> {
        self.answer(self.structural.get(path), timeout).await
    }

    async fn content(&self) -> Result<String, ScrapeError> {
        Ok(self.markup.clone())
    }

    async fn current_url(&self) -> Result<String, ScrapeError> {
        Ok(self.url.lock().map(|u| u.clone()).unwrap_or_default())
    }

    async fn screenshot(&self) -> Result<Vec<u8>, ScrapeError> {
        self.screenshots.fetch_add(1, Ordering::SeqCst);
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn frames(&self) -> Result<Vec<FrameInfo>, ScrapeError> {
        Ok(self.frames.clone())
    }

    async fn click(&self, selector: &str) -> Result<bool, ScrapeError> {
        Ok(self.clickable.contains(selector))
    }

    async fn close(&self) {}
}
