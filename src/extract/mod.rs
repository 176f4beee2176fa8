//! Channel about-page extraction.
//!
//! The extractor combines three layers in order of reliability: the page's
//! structured bootstrap object, DOM probes, and a regex scan of the raw markup.
//! Consent and CAPTCHA handling run before any field is read.

mod dom;
mod extractor;
mod hygiene;
mod markup;
mod page;
mod record;
mod structured;
mod verification;

#[cfg(test)]
pub(crate) mod testing;

pub use dom::{LookupBudget, DOM_SETTLED_TIMEOUT};
pub use extractor::{ChannelExtractor, ExtractorSettings, DOM_LAYER_BUDGET, DOM_QUERY_TIMEOUT};
pub use hygiene::{check_captcha, dismiss_consent, HYGIENE_QUERY_TIMEOUT};
pub use markup::social_links_from_markup;
pub use page::{ChannelPage, ElementSnapshot, FrameInfo, NavigationResponse};
pub use record::{ChannelRecord, ExtractionSource, UNKNOWN_CHANNEL_NAME};
pub use structured::{
    extract_bootstrap_object, probe, probe_all, read_structured_fields, text_of, Seg,
    StructuredFields, INITIAL_DATA_SCRIPT, INITIAL_DATA_VAR,
};
pub use verification::{categorize_badge_text, detect_verification, VerificationCategory};
