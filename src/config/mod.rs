//! Configuration module for Price Sentinel
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use price_sentinel::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sentinel.toml")).unwrap();
//! println!("Requests per minute: {}", config.rate_limit.requests_per_minute);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{
    Config, FetcherConfig, NotifyConfig, OutputConfig, RateLimitConfig, RecipesConfig,
    RetryConfig, UserAgentConfig, WatchEntry,
};

pub use parser::{load_config, parse_config};
