//! Output record for one channel.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::verification::VerificationCategory;
use crate::input::InputSource;
use crate::parse::PlatformLinks;

/// Display name used when no layer yields a name.
pub const UNKNOWN_CHANNEL_NAME: &str = "Unknown Channel";

/// Which extraction layer supplied most of a record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    StructuredData,
    Dom,
    Markup,
    /// No layer produced anything
    None,
}

/// Per-layer field counters used to pick the [`ExtractionSource`].
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SourceTally {
    pub(crate) structured: usize,
    pub(crate) dom: usize,
    pub(crate) markup: usize,
}

impl SourceTally {
    /// Layer with the most fields; ties go to the more reliable layer.
    pub(crate) fn dominant(&self) -> ExtractionSource {
        let best = self.structured.max(self.dom).max(self.markup);
        if best == 0 {
            ExtractionSource::None
        } else if self.structured == best {
            ExtractionSource::StructuredData
        } else if self.dom == best {
            ExtractionSource::Dom
        } else {
            ExtractionSource::Markup
        }
    }
}

/// Profile data extracted from one channel's about surface.
///
/// Text fields are empty strings and lists are empty when unknown; they are
/// never absent from the serialized record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelRecord {
    pub url: String,
    pub name: String,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub view_count: u64,
    pub joined_date: String,
    pub location: String,
    pub description: String,
    pub avatar_url: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub links: PlatformLinks,
    pub verification: VerificationCategory,
    pub extraction_source: ExtractionSource,
    pub input_source: InputSource,
    pub input_origin: Option<String>,
    pub scraped_at: DateTime<Utc>,
    pub processing_ms: u64,
}

impl ChannelRecord {
    /// True when only placeholder data could be extracted.
    pub fn is_partial(&self) -> bool {
        self.name == UNKNOWN_CHANNEL_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_source() {
        let tally = SourceTally { structured: 5, dom: 2, markup: 1 };
        assert_eq!(tally.dominant(), ExtractionSource::StructuredData);
        let tally = SourceTally { structured: 1, dom: 3, markup: 1 };
        assert_eq!(tally.dominant(), ExtractionSource::Dom);
        let tally = SourceTally { structured: 0, dom: 0, markup: 1 };
        assert_eq!(tally.dominant(), ExtractionSource::Markup);
        let tally = SourceTally { structured: 2, dom: 2, markup: 0 };
        assert_eq!(tally.dominant(), ExtractionSource::StructuredData);
        assert_eq!(SourceTally::default().dominant(), ExtractionSource::None);
    }

    #[test]
    fn test_serialized_shape() {
        let record = ChannelRecord {
            url: "https://www.youtube.com/@a".into(),
            name: UNKNOWN_CHANNEL_NAME.into(),
            subscriber_count: 0,
            video_count: 0,
            view_count: 0,
            joined_date: String::new(),
            location: String::new(),
            description: String::new(),
            avatar_url: String::new(),
            emails: vec![],
            phones: vec![],
            links: PlatformLinks::empty(),
            verification: VerificationCategory::Unknown,
            extraction_source: ExtractionSource::None,
            input_source: InputSource::DirectInput,
            input_origin: None,
            scraped_at: Utc::now(),
            processing_ms: 0,
        };
        assert!(record.is_partial());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["emails"], serde_json::json!([]));
        assert_eq!(json["links"]["spotify"], serde_json::json!([]));
        assert_eq!(json["verification"], "unknown");
        assert_eq!(json["extraction_source"], "none");
        assert_eq!(json["input_source"], "direct_input");
    }
}
