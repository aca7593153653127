//! Turning HTML into price fields
//!
//! - [`parse_price`]: locale-tolerant numeric normalization
//! - [`PriceExtractor`]: evaluates a recipe's selectors against a page

mod extractor;
pub mod normalize;

pub use extractor::{ExtractedFields, PriceExtractor};
pub use normalize::parse_price;
