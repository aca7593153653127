use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Price Sentinel
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(rename = "rate-limit", default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub recipes: RecipesConfig,
    #[serde(default)]
    pub watch: Vec<WatchEntry>,
}

/// Page retrieval configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherConfig {
    /// Timeout for a single render/GET (milliseconds)
    #[serde(rename = "timeout-ms", default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Timeout for robots.txt retrieval (milliseconds)
    #[serde(rename = "robots-timeout-ms", default = "default_robots_timeout_ms")]
    pub robots_timeout_ms: u64,

    /// Whether robots.txt is consulted at all
    #[serde(rename = "respect-robots", default = "default_true")]
    pub respect_robots: bool,

    /// Upper bound applied to robots.txt Crawl-delay values (milliseconds)
    #[serde(rename = "max-crawl-delay-ms", default = "default_max_crawl_delay_ms")]
    pub max_crawl_delay_ms: u64,
}

impl FetcherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_millis(self.robots_timeout_ms)
    }

    pub fn max_crawl_delay(&self) -> Duration {
        Duration::from_millis(self.max_crawl_delay_ms)
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            robots_timeout_ms: default_robots_timeout_ms(),
            respect_robots: true,
            max_crawl_delay_ms: default_max_crawl_delay_ms(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,

    /// Optional browser user agents to rotate through instead of the identity string
    #[serde(default)]
    pub rotate: Vec<String>,
}

impl UserAgentConfig {
    /// Formats the crawler identity: `Name/Version (+ContactURL; ContactEmail)`
    pub fn identity(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Request spacing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per minute to a single domain
    #[serde(rename = "requests-per-minute", default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Minimum spacing between any two requests (milliseconds)
    #[serde(rename = "global-delay-ms", default = "default_global_delay_ms")]
    pub global_delay_ms: u64,
}

impl RateLimitConfig {
    pub fn global_delay(&self) -> Duration {
        Duration::from_millis(self.global_delay_ms)
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            global_delay_ms: default_global_delay_ms(),
        }
    }
}

/// Retry and backoff configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Number of retries after the first attempt
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Multiplier applied to the delay after each failed attempt
    #[serde(rename = "backoff-factor", default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Delay before the first retry (milliseconds)
    #[serde(rename = "initial-delay-ms", default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for any single backoff (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Notification sinks
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Log and print alerts to the console
    #[serde(default = "default_true")]
    pub console: bool,

    /// POST alerts as JSON to this URL
    #[serde(rename = "webhook-url", default)]
    pub webhook_url: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            console: true,
            webhook_url: None,
        }
    }
}

/// Where extraction recipes live
#[derive(Debug, Clone, Deserialize)]
pub struct RecipesConfig {
    /// Directory scanned for `*.toml` recipe files
    #[serde(default = "default_recipes_dir")]
    pub directory: String,
}

impl Default for RecipesConfig {
    fn default() -> Self {
        Self {
            directory: default_recipes_dir(),
        }
    }
}

/// A product page to track
#[derive(Debug, Clone, Deserialize)]
pub struct WatchEntry {
    pub url: String,
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    15_000
}

fn default_robots_timeout_ms() -> u64 {
    10_000
}

fn default_max_crawl_delay_ms() -> u64 {
    60_000
}

fn default_requests_per_minute() -> u32 {
    10
}

fn default_global_delay_ms() -> u64 {
    1_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_recipes_dir() -> String {
    "recipes".to_string()
}
