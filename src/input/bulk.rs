//! Bulk import readers (CSV/TSV, plain text, JSON).
//!
//! Every reader is lenient: rows it cannot interpret are skipped with a
//! warning, and validation of the references themselves is left to the
//! normalizer.

use std::path::Path;

use log::{debug, warn};
use serde_json::Value;

use super::normalize::BulkRecord;
use crate::error_handling::ConfigError;

/// Header names recognized as the channel column (case-insensitive).
const URL_COLUMN_NAMES: &[&str] = &["url", "channel", "link", "channel_url", "channelurl", "channel url"];

/// Supported bulk import formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkFormat {
    /// Comma-separated values with optional header row
    Csv,
    /// Tab-separated values with optional header row
    Tsv,
    /// One reference per line, `#` starts a comment
    Text,
    /// Array of strings, or array of objects with a url-like field
    Json,
}

impl BulkFormat {
    /// Picks the format from a file extension.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnsupportedBulkFormat` for spreadsheet formats.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(BulkFormat::Csv),
            "tsv" => Ok(BulkFormat::Tsv),
            "json" => Ok(BulkFormat::Json),
            "xlsx" | "xls" | "xlsm" | "ods" => Err(ConfigError::UnsupportedBulkFormat(ext)),
            _ => Ok(BulkFormat::Text),
        }
    }
}

/// Reads and parses a bulk import file.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read or its format is unsupported.
pub async fn read_bulk_file(path: &Path) -> Result<Vec<BulkRecord>, ConfigError> {
    let format = BulkFormat::from_path(path)?;
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ConfigError::UnreadableFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
    let records = parse_bulk(&bytes, format);
    log::info!("Read {} row(s) from bulk import {}", records.len(), path.display());
    Ok(records)
}

/// Parses bulk import content in the given format.
pub fn parse_bulk(bytes: &[u8], format: BulkFormat) -> Vec<BulkRecord> {
    match format {
        BulkFormat::Csv => parse_delimited(bytes, b','),
        BulkFormat::Tsv => parse_delimited(bytes, b'\t'),
        BulkFormat::Text => parse_text(bytes),
        BulkFormat::Json => parse_json(bytes),
    }
}

fn parse_text(bytes: &[u8]) -> Vec<BulkRecord> {
    String::from_utf8_lossy(bytes)
        .lines()
        .enumerate()
        .filter_map(|(i, line)| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            Some(BulkRecord {
                url: line.to_string(),
                row: i + 1,
            })
        })
        .collect()
}

fn parse_delimited(bytes: &[u8], delimiter: u8) -> Vec<BulkRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes);

    let mut column = 0usize;
    let mut records = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let row = i + 1;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("Skipping malformed bulk import row {}: {}", row, e);
                continue;
            }
        };

        if row == 1 {
            let header = record.iter().position(|field| {
                URL_COLUMN_NAMES.contains(&field.trim().to_ascii_lowercase().as_str())
            });
            if let Some(idx) = header {
                debug!("Bulk import header found; using column {}", idx);
                column = idx;
                continue;
            }
        }

        match record.get(column).map(str::trim) {
            Some(value) if !value.is_empty() => records.push(BulkRecord {
                url: value.to_string(),
                row,
            }),
            _ => debug!("Bulk import row {} has no value in column {}", row, column),
        }
    }
    records
}

fn parse_json(bytes: &[u8]) -> Vec<BulkRecord> {
    let value: Value = match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => {
            warn!("Bulk import is not valid JSON: {}", e);
            return Vec::new();
        }
    };
    let Some(items) = value.as_array() else {
        warn!("Bulk import JSON must be an array");
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let url = match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map
                    .iter()
                    .find(|(k, _)| URL_COLUMN_NAMES.contains(&k.to_ascii_lowercase().as_str()))
                    .and_then(|(_, v)| v.as_str())
                    .map(str::to_string),
                _ => None,
            };
            if url.is_none() {
                warn!("Skipping bulk import entry {} without a channel URL", i + 1);
            }
            url.map(|url| BulkRecord { url, row: i + 1 })
        })
        .collect()
}
