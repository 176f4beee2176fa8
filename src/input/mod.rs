//! Input normalization: direct URLs, bulk import files and keyword search.

mod bulk;
mod canonical;
mod normalize;
mod search;

pub use bulk::{parse_bulk, read_bulk_file, BulkFormat};
pub use canonical::{canonicalize_channel_url, ChannelIdentifier, InputSource, CANONICAL_ORIGIN};
pub use normalize::{apply_resume_marker, normalize, BulkRecord, InputSources, SearchHit};
pub use search::{collect_keyword_results, parse_search_results, ChannelSearch, YoutubeSearch};
