//! Text and link decoding.
//!
//! This module turns raw page strings into typed values:
//! - Compact counts ("1.2M subscribers") into integers
//! - Free text into contact emails and phone numbers
//! - Outbound links into platform buckets
//! - URLs into their query-less form

mod cleanup;
mod contact;
mod count;
mod social;

// Re-export public API
pub use cleanup::clean_url;
pub use contact::{extract_contact_info, ContactInfo};
pub use count::parse_compact_count;
pub use social::{categorize, Platform, PlatformLinks};
