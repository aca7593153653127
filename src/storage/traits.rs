//! Storage traits and error types

use crate::engine::ExtractedRecord;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored price '{0}' is not a decimal")]
    Decimal(String),

    #[error("Stored timestamp '{0}' is not RFC 3339")]
    Timestamp(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Aggregate figures over the price history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceStats {
    pub total_records: u64,
    pub products: u64,
    pub sites: u64,
    pub last_update: Option<DateTime<Utc>>,
}

/// Persistence for extracted price records
pub trait PriceStore {
    /// Appends one observation
    fn append(&mut self, record: &ExtractedRecord) -> StorageResult<()>;

    /// Returns up to `limit` records for `product_key`, most recent first
    fn latest(&self, product_key: &str, limit: usize) -> StorageResult<Vec<ExtractedRecord>>;

    /// Returns aggregate statistics over every stored record
    fn stats(&self) -> StorageResult<PriceStats>;
}
