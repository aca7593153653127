//! Robots.txt handling module
//!
//! This module fetches, parses, and caches robots.txt files and answers the two
//! questions the fetcher asks before every request: may this URL be fetched,
//! and how long should requests to this domain be spaced.

mod cache;
mod parser;
mod policy;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;
pub use policy::DomainPolicy;
