//! Verification badge detection.

use serde::Serialize;

use super::dom::{DomQuery, LookupBudget};
use super::page::ChannelPage;

/// Verification status of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationCategory {
    /// Positively known to carry no badge. Detection never asserts this on its
    /// own; absence of a badge signal is reported as `Unknown`.
    Unverified,
    Verified,
    OfficialArtistChannel,
    Unknown,
}

/// Tooltip containers attached to header badges.
const BADGE_TOOLTIP_SELECTORS: &[&str] = &[
    "#channel-header ytd-badge-supported-renderer tp-yt-paper-tooltip #tooltip",
    "ytd-channel-name ytd-badge-supported-renderer tp-yt-paper-tooltip",
];

/// Elements carrying an accessible label for the badge.
const BADGE_ARIA_SELECTOR: &str =
    "#channel-header ytd-badge-supported-renderer [aria-label], yt-page-header-renderer [aria-label]";

/// Maps badge text (tooltip, label, or badge icon name) to a category.
pub fn categorize_badge_text(text: &str) -> Option<VerificationCategory> {
    let lower = text.to_lowercase();
    if lower.contains("official artist") || lower.contains("audio_badge") || lower.contains("official_artist") {
        Some(VerificationCategory::OfficialArtistChannel)
    } else if lower.contains("verified") || lower.contains("check_circle") {
        Some(VerificationCategory::Verified)
    } else {
        None
    }
}

/// Determines the verification category.
///
/// Signals in order: badge tooltips from the structured object, the DOM badge
/// tooltip text, then an aria-label containing "Verified". No signal means
/// `Unknown`. Tooltip lookups draw on the extraction's shared `budget`.
pub async fn detect_verification(
    page: &dyn ChannelPage,
    structured_badges: &[String],
    budget: &LookupBudget,
) -> VerificationCategory {
    if let Some(category) = structured_badges.iter().find_map(|b| categorize_badge_text(b)) {
        return category;
    }

    for selector in BADGE_TOOLTIP_SELECTORS {
        if let Some(tooltip) = budget.query(page, DomQuery::Css(selector)).await {
            if let Some(category) = tooltip.trimmed_text().and_then(categorize_badge_text) {
                return category;
            }
        }
    }

    if let Ok(labelled) = page.query_selector_all(BADGE_ARIA_SELECTOR).await {
        let verified = labelled
            .iter()
            .filter_map(|el| el.attribute("aria-label"))
            .find_map(|label| {
                if label.contains("Official Artist") {
                    Some(VerificationCategory::OfficialArtistChannel)
                } else if label.contains("Verified") {
                    Some(VerificationCategory::Verified)
                } else {
                    None
                }
            });
        if let Some(category) = verified {
            return category;
        }
    }

    VerificationCategory::Unknown
}
