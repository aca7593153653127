//! Extraction recipes
//!
//! A recipe tells the extractor which selectors to evaluate for one domain.
//! Recipes are TOML documents:
//!
//! ```toml
//! domain = "shop.example.com"
//!
//! [fields.price]
//! kind = "css"
//! expression = ".price"
//!
//! [fields.product_title]
//! expression = "h1"
//!
//! [options]
//! dynamic = false
//! currency = "EUR"
//! ```
//!
//! Every recipe must define a `price` field. Selectors are compiled when the
//! recipe is loaded, so a recipe that loads cannot fail on a bad expression
//! later.

mod loader;
mod types;
mod validation;

pub use loader::{load_recipe, load_recipes_from_dir, parse_recipe, RecipeBook};
pub use types::{
    ExtractionRecipe, RecipeFile, RecipeOptions, SelectorKind, SelectorSpec, CURRENCY_FIELD,
    PRICE_FIELD, TITLE_FIELD,
};
pub(crate) use types::{CompiledField, CompiledSelector};

use thiserror::Error;

/// Recipe loading and validation errors
#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("Failed to read recipe: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse recipe TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Recipe for '{domain}' has no 'price' selector")]
    MissingPrice { domain: String },

    #[error("Field '{field}' uses unsupported selector kind '{kind}'")]
    UnsupportedSelectorKind { field: String, kind: String },

    #[error("Field '{field}' has invalid selector '{expression}': {reason}")]
    InvalidSelector {
        field: String,
        expression: String,
        reason: String,
    },

    #[error("Invalid recipe domain: {0}")]
    InvalidDomain(String),
}
