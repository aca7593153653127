//! Storage module for persisting price history
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Appending price observations
//! - Reading a product's most recent observations
//! - Aggregate statistics

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{PriceStats, PriceStore, StorageError, StorageResult};

use std::path::Path;

/// Opens or creates the price database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}
