//! Output sinks for channel records and terminal failures.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::jsonl::JsonlWriter;
use crate::error_handling::ErrorCategory;
use crate::extract::ChannelRecord;
use crate::input::InputSource;

/// Destination for extracted records. A record is durable once `append` returns.
#[async_trait]
pub trait RecordSink: Send + Sync {
    async fn append(&self, record: &ChannelRecord) -> Result<()>;
}

/// One identifier that failed for good.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub url: String,
    pub category: ErrorCategory,
    /// Attempts made, including the first
    pub attempts: u32,
    /// Last error message
    pub error: String,
    pub input_source: InputSource,
    pub timestamp: DateTime<Utc>,
}

/// Destination for terminal failures.
#[async_trait]
pub trait FailureSink: Send + Sync {
    async fn record(&self, failure: &FailureRecord) -> Result<()>;
}

/// Writes records as JSON Lines.
pub struct JsonlSink {
    writer: JsonlWriter<ChannelRecord>,
}

impl JsonlSink {
    /// Opens (or creates) the output file for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: JsonlWriter::open(path).await?,
        })
    }

    pub fn path(&self) -> &Path {
        self.writer.path()
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn append(&self, record: &ChannelRecord) -> Result<()> {
        self.writer.write(record).await
    }
}

/// Writes terminal failures as JSON Lines.
pub struct JsonlFailureSink {
    writer: JsonlWriter<FailureRecord>,
}

impl JsonlFailureSink {
    /// Opens (or creates) the failure log for appending.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub async fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            writer: JsonlWriter::open(path).await?,
        })
    }
}

#[async_trait]
impl FailureSink for JsonlFailureSink {
    async fn record(&self, failure: &FailureRecord) -> Result<()> {
        self.writer.write(failure).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failure_log_line_shape() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failed_requests.jsonl");
        let sink = JsonlFailureSink::open(&path).await.unwrap();
        sink.record(&FailureRecord {
            url: "https://www.youtube.com/@gone".into(),
            category: ErrorCategory::NotFound,
            attempts: 1,
            error: "HTTP 404 for https://www.youtube.com/@gone/about".into(),
            input_source: InputSource::BulkImport,
            timestamp: Utc::now(),
        })
        .await
        .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let line: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(line["category"], "not_found");
        assert_eq!(line["attempts"], 1);
        assert_eq!(line["input_source"], "bulk_import");
        assert!(line["timestamp"].is_string());
    }
}
