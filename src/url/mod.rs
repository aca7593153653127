//! URL handling module for Price Sentinel
//!
//! This module provides domain extraction, the `scheme://host[:port]` base used as
//! the unit of robots caching, and wildcard matching for recipe domains.

mod domain;
mod matcher;

pub use domain::{domain_base, extract_domain, parse_http_url};
pub use matcher::matches_wildcard;
