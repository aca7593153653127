//! Price Sentinel: a polite price tracker
//!
//! This crate fetches product pages while respecting robots.txt and rate limits,
//! retries transient failures with exponential backoff, extracts prices through
//! declarative recipes, and raises alerts when a tracked price drops.

pub mod config;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod history;
pub mod notify;
pub mod output;
pub mod ratelimit;
pub mod recipe;
pub mod retry;
pub mod robots;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Price Sentinel operations
#[derive(Debug, Error)]
pub enum SentinelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Recipe error: {0}")]
    Recipe(#[from] recipe::RecipeError),

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDisallowed { url: String },

    #[error("Client error for {url}: {source}")]
    ClientError {
        url: String,
        source: fetch::RenderError,
    },

    #[error("Giving up on {url} after {attempts} attempts: {source}")]
    RetryExhausted {
        url: String,
        attempts: u32,
        source: fetch::RenderError,
    },

    #[error("Fetch of {url} cancelled after {attempts} attempts")]
    Cancelled { url: String, attempts: u32 },

    #[error("No recipe matches {url}")]
    NoRecipe { url: String },

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SentinelError {
    /// Returns true for failures that ended a fetch for good (never retried)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::RobotsDisallowed { .. } | Self::ClientError { .. } | Self::RetryExhausted { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Price Sentinel operations
pub type Result<T> = std::result::Result<T, SentinelError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Engine, ExtractedRecord};
pub use extract::{parse_price, PriceExtractor};
pub use fetch::{ContentFetcher, FetchRequest};
pub use history::PriceHistoryGate;
pub use notify::PriceDropEvent;
pub use ratelimit::RateLimiter;
pub use recipe::{ExtractionRecipe, SelectorKind, SelectorSpec};
pub use retry::RetryPolicy;
pub use robots::DomainPolicy;
pub use url::{domain_base, extract_domain, matches_wildcard};
