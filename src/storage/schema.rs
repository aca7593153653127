//! Database schema definitions
//!
//! Prices are stored as decimal text so values round-trip exactly.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per observation
CREATE TABLE IF NOT EXISTS prices (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    captured_at TEXT NOT NULL,
    site TEXT NOT NULL,
    product TEXT NOT NULL,
    price TEXT,
    currency TEXT NOT NULL,
    url TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_prices_captured_at ON prices(captured_at);
CREATE INDEX IF NOT EXISTS idx_prices_product ON prices(product);
CREATE INDEX IF NOT EXISTS idx_prices_url ON prices(url);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
