//! In-memory sinks for embedding and tests.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::sink::{FailureRecord, FailureSink, RecordSink};
use crate::extract::ChannelRecord;

#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<ChannelRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies of all records appended so far, in append order.
    pub fn records(&self) -> Vec<ChannelRecord> {
        self.records
            .lock()
            .map(|r| r.clone())
            .unwrap_or_else(|p| p.into_inner().clone())
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn append(&self, record: &ChannelRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(record.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryFailureSink {
    failures: Mutex<Vec<FailureRecord>>,
}

impl MemoryFailureSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        self.failures
            .lock()
            .map(|f| f.clone())
            .unwrap_or_else(|p| p.into_inner().clone())
    }
}

#[async_trait]
impl FailureSink for MemoryFailureSink {
    async fn record(&self, failure: &FailureRecord) -> Result<()> {
        self.failures
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(failure.clone());
        Ok(())
    }
}
