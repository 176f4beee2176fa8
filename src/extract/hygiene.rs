//! Page hygiene: consent interstitials and CAPTCHA challenges.
//!
//! Runs before any field is read. A consent wall is dismissed when possible;
//! a CAPTCHA aborts the attempt so the caller can rotate its session.

use std::time::Duration;

use log::{debug, info};

use super::page::ChannelPage;
use crate::error_handling::ScrapeError;

/// Hosts that serve the consent interstitial.
const CONSENT_HOSTS: &[&str] = &["consent.youtube.com", "consent.google.com"];

/// Elements that indicate an inline consent dialog.
const CONSENT_DIALOG_SELECTOR: &str = "ytd-consent-bump-v2-lightbox, tp-yt-paper-dialog #consent-bump, form[action*='consent']";

/// Accept buttons, most specific first.
const CONSENT_ACCEPT_SELECTORS: &[&str] = &[
    "button[aria-label*='Accept all']",
    "button[aria-label*='Accept the use']",
    "form[action*='consent'] button",
    "ytd-consent-bump-v2-lightbox button.yt-spec-button-shape-next--filled",
];

/// Frame name/URL fragments that identify a challenge frame.
const CAPTCHA_FRAME_MARKERS: &[&str] = &["recaptcha", "captcha"];

/// Challenge elements that accompany the frame.
const CAPTCHA_ELEMENT_SELECTOR: &str = "#captcha-form, .g-recaptcha, #recaptcha, iframe[src*='recaptcha']";

/// Short wait for the consent dialog and challenge elements.
pub const HYGIENE_QUERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Detects and dismisses a consent interstitial.
///
/// # Returns
///
/// `Ok(true)` if an interstitial was found and dismissed, `Ok(false)` if none was shown.
///
/// # Errors
///
/// Returns `ScrapeError::ConsentBlocked` if an interstitial was shown but no accept
/// control could be clicked.
pub async fn dismiss_consent(page: &dyn ChannelPage) -> Result<bool, ScrapeError> {
    let url = page.current_url().await.unwrap_or_default();
    let on_consent_host = CONSENT_HOSTS.iter().any(|h| url.contains(h));
    let dialog = if on_consent_host {
        true
    } else {
        page.query_selector(CONSENT_DIALOG_SELECTOR, HYGIENE_QUERY_TIMEOUT)
            .await
            .ok()
            .flatten()
            .is_some()
    };
    if !dialog {
        return Ok(false);
    }

    debug!("Consent interstitial shown at {}", url);
    for selector in CONSENT_ACCEPT_SELECTORS {
        if page.click(selector).await.unwrap_or(false) {
            info!("Dismissed consent interstitial at {}", url);
            return Ok(true);
        }
    }
    Err(ScrapeError::ConsentBlocked { url })
}

/// Fails with `CaptchaDetected` if the page shows a CAPTCHA challenge.
///
/// Both signals are required: a challenge sub-frame and a challenge element.
/// A lone frame (e.g. an invisible reCAPTCHA on a normal page) is not enough.
pub async fn check_captcha(page: &dyn ChannelPage) -> Result<(), ScrapeError> {
    let frames = page.frames().await.unwrap_or_default();
    let has_frame = frames.iter().any(|f| {
        let name = f.name.to_lowercase();
        let url = f.url.to_lowercase();
        CAPTCHA_FRAME_MARKERS
            .iter()
            .any(|m| name.contains(m) || url.contains(m))
    });
    if !has_frame {
        return Ok(());
    }

    let challenge = page
        .query_selector(CAPTCHA_ELEMENT_SELECTOR, HYGIENE_QUERY_TIMEOUT)
        .await
        .ok()
        .flatten();
    if challenge.is_some() {
        let url = page.current_url().await.unwrap_or_default();
        return Err(ScrapeError::CaptchaDetected { url });
    }
    Ok(())
}
