use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// One observation of a product's price
///
/// `price` is `None` when the page could not be read as a price; it is never
/// replaced by a sentinel value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedRecord {
    /// Host the page was fetched from
    pub site: String,
    /// Product title, or the page URL when the page has no title field
    pub product_title: String,
    pub price: Option<Decimal>,
    pub currency: String,
    pub url: String,
    pub captured_at: DateTime<Utc>,
}

impl ExtractedRecord {
    /// Key under which price history is tracked
    pub fn product_key(&self) -> &str {
        &self.product_title
    }
}
