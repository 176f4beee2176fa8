//! DOM fallback layer: selector and structural-path probes with short timeouts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use log::debug;
use tokio::time::Instant;
use url::Url;

use super::page::{ChannelPage, ElementSnapshot};

/// How a probe locates its element.
#[derive(Debug, Clone, Copy)]
pub(crate) enum DomQuery {
    Css(&'static str),
    Structural(&'static str),
}

/// What a probe reads from the located element.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Read {
    Text,
    Attr(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DomProbe {
    query: DomQuery,
    read: Read,
}

const fn css(selector: &'static str, read: Read) -> DomProbe {
    DomProbe {
        query: DomQuery::Css(selector),
        read,
    }
}

const fn xpath(path: &'static str, read: Read) -> DomProbe {
    DomProbe {
        query: DomQuery::Structural(path),
        read,
    }
}

pub(crate) const NAME: &[DomProbe] = &[
    css("yt-page-header-renderer h1 .yt-core-attributed-string", Read::Text),
    css("#channel-name #text", Read::Text),
    css("#channel-header-container #text", Read::Text),
    css("meta[property='og:title']", Read::Attr("content")),
    xpath("//meta[@itemprop='name']", Read::Attr("content")),
];

pub(crate) const SUBSCRIBERS: &[DomProbe] = &[
    css("#subscriber-count", Read::Text),
    xpath("//*[@id='additional-info-container']//td[contains(., 'subscriber')]", Read::Text),
];

pub(crate) const VIDEOS: &[DomProbe] = &[
    css("#videos-count", Read::Text),
    xpath("//*[@id='additional-info-container']//td[contains(., 'video')]", Read::Text),
];

pub(crate) const VIEWS: &[DomProbe] = &[
    xpath("//*[@id='additional-info-container']//td[contains(., 'view')]", Read::Text),
    css("#right-column yt-formatted-string:nth-of-type(3)", Read::Text),
];

pub(crate) const DESCRIPTION: &[DomProbe] = &[
    css("#description-container yt-attributed-string", Read::Text),
    css("#description-container", Read::Text),
    css("meta[property='og:description']", Read::Attr("content")),
    css("meta[name='description']", Read::Attr("content")),
];

pub(crate) const LOCATION: &[DomProbe] = &[
    xpath("//*[@id='additional-info-container']//tr[.//yt-icon[@icon='privacy_public']]/td[2]", Read::Text),
    css("#details-container tr:nth-child(2) td:nth-child(2)", Read::Text),
];

pub(crate) const JOINED: &[DomProbe] = &[
    xpath("//*[@id='additional-info-container']//td[contains(., 'Joined')]", Read::Text),
    css("#right-column yt-formatted-string:nth-of-type(2)", Read::Text),
];

pub(crate) const AVATAR: &[DomProbe] = &[
    css("yt-avatar-shape img", Read::Attr("src")),
    css("#avatar img", Read::Attr("src")),
    css("meta[property='og:image']", Read::Attr("content")),
    css("link[itemprop='thumbnailUrl']", Read::Attr("href")),
];

/// Anchor lists holding the channel's outbound links.
pub(crate) const LINK_LISTS: &[&str] = &[
    "#link-list-container a",
    "#links-section a",
    "yt-channel-external-link-view-model a",
    "#primary-links a",
];

/// Element wait once the page has rendered. Only the first lookup waits longer.
pub const DOM_SETTLED_TIMEOUT: Duration = Duration::from_millis(250);

/// Wait budget shared by every element lookup of one extraction.
///
/// The first lookup may wait `first_wait` for the page to render; later ones
/// wait at most `settled_wait`. No lookup outlives the layer deadline, so a
/// page missing every optional field still finishes the layer on time.
#[derive(Debug)]
pub struct LookupBudget {
    deadline: Instant,
    first_wait: Duration,
    settled_wait: Duration,
    rendered: AtomicBool,
}

impl LookupBudget {
    /// Starts the budget now.
    ///
    /// # Arguments
    ///
    /// * `first_wait` - Wait granted to the first lookup
    /// * `total` - Wall-clock cap for all lookups together
    pub fn new(first_wait: Duration, total: Duration) -> Self {
        Self {
            deadline: Instant::now() + total,
            first_wait,
            settled_wait: first_wait.min(DOM_SETTLED_TIMEOUT),
            rendered: AtomicBool::new(false),
        }
    }

    /// Wait for the next lookup, or `None` once the layer deadline has passed.
    pub fn next_wait(&self) -> Option<Duration> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return None;
        }
        let wait = if self.rendered.swap(true, Ordering::Relaxed) {
            self.settled_wait
        } else {
            self.first_wait
        };
        Some(wait.min(remaining))
    }

    /// Runs one element lookup, cut off at the layer deadline.
    ///
    /// Returns `None` without querying when the budget is spent.
    pub(crate) async fn query(
        &self,
        page: &dyn ChannelPage,
        query: DomQuery,
    ) -> Option<ElementSnapshot> {
        let wait = self.next_wait()?;
        let lookup = async {
            match query {
                DomQuery::Css(selector) => page.query_selector(selector, wait).await,
                DomQuery::Structural(path) => page.query_structural(path, wait).await,
            }
        };
        match tokio::time::timeout_at(self.deadline, lookup).await {
            Ok(Ok(found)) => found,
            Ok(Err(e)) => {
                debug!("DOM lookup {:?} failed: {}", query, e);
                None
            }
            Err(_) => {
                debug!("DOM lookup {:?} cut off by the layer deadline", query);
                None
            }
        }
    }
}

/// Base for resolving relative hrefs found in channel pages.
const PAGE_BASE: &str = "https://www.youtube.com/";

fn read(element: &ElementSnapshot, read: Read) -> Option<String> {
    let value = match read {
        Read::Text => element.trimmed_text()?,
        Read::Attr(name) => element.attribute(name)?.trim(),
    };
    (!value.is_empty()).then(|| value.to_string())
}

/// Runs probes in order and returns the first non-empty value.
///
/// Probe failures (timeouts, runtime errors) and a spent budget count as misses.
pub(crate) async fn first_value(
    page: &dyn ChannelPage,
    probes: &[DomProbe],
    budget: &LookupBudget,
) -> Option<String> {
    for probe in probes {
        if let Some(element) = budget.query(page, probe.query).await {
            if let Some(value) = read(&element, probe.read) {
                return Some(value);
            }
        }
    }
    None
}

/// Collects absolute outbound hrefs from the link lists.
pub(crate) async fn outbound_links(page: &dyn ChannelPage) -> Vec<String> {
    let base = Url::parse(PAGE_BASE).ok();
    let mut links: Vec<String> = Vec::new();
    for selector in LINK_LISTS {
        let anchors = match page.query_selector_all(selector).await {
            Ok(a) => a,
            Err(e) => {
                debug!("Link list {} unavailable: {}", selector, e);
                continue;
            }
        };
        for anchor in anchors {
            let Some(href) = anchor.attribute("href").map(str::trim).filter(|h| !h.is_empty()) else {
                continue;
            };
            let absolute = match (&base, Url::parse(href)) {
                (_, Ok(u)) => u.to_string(),
                (Some(base), Err(_)) => match base.join(href) {
                    Ok(u) => u.to_string(),
                    Err(_) => continue,
                },
                (None, Err(_)) => continue,
            };
            if !links.contains(&absolute) {
                links.push(absolute);
            }
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::testing::StubPage;

    const T: Duration = Duration::from_millis(10);

    fn budget() -> LookupBudget {
        LookupBudget::new(T, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn test_first_value_order_and_attr() {
        let page = StubPage::new("https://www.youtube.com/@a/about")
            .with_element("#channel-name #text", ElementSnapshot::with_text("  "))
            .with_element(
                "meta[property='og:title']",
                ElementSnapshot::default().attr("content", "Maker"),
            );
        assert_eq!(first_value(&page, NAME, &budget()).await.as_deref(), Some("Maker"));
    }

    #[tokio::test]
    async fn test_structural_probe() {
        let page = StubPage::new("https://www.youtube.com/@a/about").with_structural(
            "//*[@id='additional-info-container']//td[contains(., 'subscriber')]",
            ElementSnapshot::with_text("1.2M subscribers"),
        );
        assert_eq!(
            first_value(&page, SUBSCRIBERS, &budget()).await.as_deref(),
            Some("1.2M subscribers")
        );
    }

    #[tokio::test]
    async fn test_nothing_found() {
        let page = StubPage::new("https://www.youtube.com/@a/about");
        assert_eq!(first_value(&page, VIEWS, &budget()).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_waits_long_only_once() {
        let budget = LookupBudget::new(Duration::from_secs(3), Duration::from_secs(10));
        assert_eq!(budget.next_wait(), Some(Duration::from_secs(3)));
        assert_eq!(budget.next_wait(), Some(DOM_SETTLED_TIMEOUT));
        assert_eq!(budget.next_wait(), Some(DOM_SETTLED_TIMEOUT));

        tokio::time::advance(Duration::from_millis(9_900)).await;
        assert_eq!(budget.next_wait(), Some(Duration::from_millis(100)));
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(budget.next_wait(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_misses_end_at_layer_deadline() {
        let page = StubPage::new("https://www.youtube.com/@a/about").with_slow_misses();
        let budget = LookupBudget::new(Duration::from_secs(3), Duration::from_secs(4));
        let started = Instant::now();

        assert_eq!(first_value(&page, DESCRIPTION, &budget).await, None);
        assert_eq!(first_value(&page, AVATAR, &budget).await, None);
        assert_eq!(first_value(&page, NAME, &budget).await, None);

        // 3s render wait, then 250ms lookups until the 4s deadline
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(4_050), "{elapsed:?}");
        assert_eq!(budget.next_wait(), None);
    }

    #[tokio::test]
    async fn test_outbound_links_resolved_and_deduplicated() {
        let page = StubPage::new("https://www.youtube.com/@a/about")
            .with_elements(
                "#link-list-container a",
                vec![
                    ElementSnapshot::default().attr("href", "/redirect?q=https%3A%2F%2Fexample.com"),
                    ElementSnapshot::default().attr("href", "https://instagram.com/maker"),
                    ElementSnapshot::default(),
                ],
            )
            .with_elements(
                "#links-section a",
                vec![ElementSnapshot::default().attr("href", "https://instagram.com/maker")],
            );
        let links = outbound_links(&page).await;
        assert_eq!(
            links,
            vec![
                "https://www.youtube.com/redirect?q=https%3A%2F%2Fexample.com".to_string(),
                "https://instagram.com/maker".to_string(),
            ]
        );
    }
}
