//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the PriceStore trait.

use crate::engine::ExtractedRecord;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{PriceStats, PriceStore, StorageError, StorageResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// Missing parent directories are created.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        debug!(path = %path.display(), "Opened price database");

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl PriceStore for SqliteStore {
    fn append(&mut self, record: &ExtractedRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO prices (captured_at, site, product, price, currency, url)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                format_timestamp(&record.captured_at),
                record.site,
                record.product_title,
                record.price.map(|p| p.to_string()),
                record.currency,
                record.url,
            ],
        )?;
        Ok(())
    }

    fn latest(&self, product_key: &str, limit: usize) -> StorageResult<Vec<ExtractedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT captured_at, site, product, price, currency, url
             FROM prices
             WHERE product = ?1
             ORDER BY captured_at DESC, id DESC
             LIMIT ?2",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![product_key, limit], raw_row)?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row?.into_record()?);
        }
        Ok(records)
    }

    fn stats(&self) -> StorageResult<PriceStats> {
        let (total_records, products, sites, last_update) = self.conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT product), COUNT(DISTINCT site), MAX(captured_at)
             FROM prices",
            [],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            },
        )?;

        Ok(PriceStats {
            total_records: total_records as u64,
            products: products as u64,
            sites: sites as u64,
            last_update: last_update.as_deref().map(parse_timestamp).transpose()?,
        })
    }
}

/// Row as stored, before decimal and timestamp decoding
struct RawRow {
    captured_at: String,
    site: String,
    product: String,
    price: Option<String>,
    currency: String,
    url: String,
}

impl RawRow {
    fn into_record(self) -> StorageResult<ExtractedRecord> {
        let price = self
            .price
            .map(|p| Decimal::from_str(&p).map_err(|_| StorageError::Decimal(p)))
            .transpose()?;

        Ok(ExtractedRecord {
            site: self.site,
            product_title: self.product,
            price,
            currency: self.currency,
            url: self.url,
            captured_at: parse_timestamp(&self.captured_at)?,
        })
    }
}

fn raw_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        captured_at: row.get(0)?,
        site: row.get(1)?,
        product: row.get(2)?,
        price: row.get(3)?,
        currency: row.get(4)?,
        url: row.get(5)?,
    })
}

/// Fixed-width UTC timestamps so text ordering matches time ordering
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| StorageError::Timestamp(text.to_string()))
}
