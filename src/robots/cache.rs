//! Cached robots.txt policy for one `scheme://host[:port]` base

use crate::robots::ParsedRobots;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Robots policy as resolved for a domain base
///
/// Entries are never re-fetched for the lifetime of the process, so
/// `fetched_at` is informational only.
#[derive(Debug, Clone)]
pub struct CachedRobots {
    /// The parsed robots.txt content
    pub content: ParsedRobots,

    /// When the robots.txt was resolved
    pub fetched_at: DateTime<Utc>,
}

impl CachedRobots {
    /// Wraps parsed robots.txt content with the current timestamp
    pub fn new(content: ParsedRobots) -> Self {
        Self {
            content,
            fetched_at: Utc::now(),
        }
    }

    /// The entry used when robots.txt is unavailable
    pub fn permissive() -> Self {
        Self::new(ParsedRobots::allow_all())
    }

    /// Checks if a URL is allowed according to the cached robots.txt
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        self.content.is_allowed(url, user_agent)
    }

    /// Gets the crawl delay from the cached robots.txt
    pub fn crawl_delay(&self, user_agent: &str) -> Option<Duration> {
        self.content.crawl_delay(user_agent)
    }
}
