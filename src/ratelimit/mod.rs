//! Request spacing per domain and across all domains
//!
//! Every fetch passes through [`RateLimiter::wait_if_needed`] before it is
//! sent. Two floors apply: a per-domain spacing derived from the configured
//! requests-per-minute (or a robots.txt Crawl-delay), and a global spacing
//! between any two requests.
//!
//! # Locking
//!
//! Each domain has its own async lock, held for the whole call, so callers for
//! the same domain are released one at a time and observe the spacing. The
//! global lock is only held while honoring the global floor, so callers for
//! different domains never wait on each other for longer than that floor.
//! Locks are always taken domain first, then global.

use crate::config::RateLimitConfig;
use crate::state::{DomainState, GlobalRateState};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Snapshot of one domain's spacing state
#[derive(Debug, Clone, PartialEq)]
pub struct DomainStats {
    pub domain: String,
    pub request_count: u64,
    pub last_request_at: Option<Instant>,
    pub elapsed: Option<Duration>,
    pub can_request_now: bool,
}

/// Snapshot of the limiter's configuration and size
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterStats {
    pub requests_per_minute: u32,
    pub min_delay: Duration,
    pub global_delay: Duration,
    pub domains_tracked: usize,
    pub last_global_request: Option<Instant>,
}

/// Enforces minimum spacing between requests
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_minute: u32,
    min_delay: Duration,
    global_delay: Duration,
    domains: Mutex<HashMap<String, Arc<Mutex<DomainState>>>>,
    global: Mutex<GlobalRateState>,
}

impl RateLimiter {
    /// Creates a limiter
    ///
    /// # Arguments
    ///
    /// * `requests_per_minute` - Per-domain rate; values below 1 are treated as 1
    /// * `global_delay` - Minimum spacing between any two requests
    pub fn new(requests_per_minute: u32, global_delay: Duration) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        let per_domain = Duration::from_secs_f64(60.0 / requests_per_minute as f64);
        let min_delay = per_domain.max(global_delay);

        info!(
            requests_per_minute,
            min_delay_ms = min_delay.as_millis() as u64,
            global_delay_ms = global_delay.as_millis() as u64,
            "Rate limiter initialized"
        );

        Self {
            requests_per_minute,
            min_delay,
            global_delay,
            domains: Mutex::new(HashMap::new()),
            global: Mutex::new(GlobalRateState::default()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_minute, config.global_delay())
    }

    /// Default per-domain spacing: `max(60 / requests_per_minute, global_delay)`
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Waits until a request to `domain` may be sent, then records it
    ///
    /// `custom_delay` replaces the default per-domain spacing for this call
    /// (typically a robots.txt Crawl-delay). The global floor always applies.
    /// Both timestamps are set to the instant the wait completed.
    pub async fn wait_if_needed(&self, domain: &str, custom_delay: Option<Duration>) {
        let slot = self.domain_slot(domain).await;
        let mut state = slot.lock().await;

        let required = custom_delay.unwrap_or(self.min_delay);
        let wait_domain = state.time_until_next_request(required, Instant::now());
        if !wait_domain.is_zero() {
            debug!(
                domain,
                wait_ms = wait_domain.as_millis() as u64,
                "Rate limiting: waiting for domain spacing"
            );
            sleep(wait_domain).await;
        }

        let released = {
            let mut global = self.global.lock().await;
            let wait_global = global.time_until_next_request(self.global_delay, Instant::now());
            if !wait_global.is_zero() {
                debug!(
                    domain,
                    wait_ms = wait_global.as_millis() as u64,
                    "Rate limiting: waiting for global spacing"
                );
                sleep(wait_global).await;
            }
            let now = Instant::now();
            global.last_request_at = Some(now);
            now
        };

        state.record_request(released);
    }

    /// Returns spacing statistics for one domain, `None` if it was never seen
    pub async fn domain_stats(&self, domain: &str) -> Option<DomainStats> {
        let slot = {
            let domains = self.domains.lock().await;
            domains.get(domain).cloned()?
        };
        let state = slot.lock().await;
        let now = Instant::now();
        let elapsed = state.elapsed(now);

        Some(DomainStats {
            domain: domain.to_string(),
            request_count: state.request_count,
            last_request_at: state.last_request_at,
            elapsed,
            can_request_now: elapsed.map_or(true, |e| e >= self.min_delay),
        })
    }

    /// Returns the limiter configuration and the number of tracked domains
    pub async fn stats(&self) -> RateLimiterStats {
        let domains_tracked = self.domains.lock().await.len();
        let last_global_request = self.global.lock().await.last_request_at;

        RateLimiterStats {
            requests_per_minute: self.requests_per_minute,
            min_delay: self.min_delay,
            global_delay: self.global_delay,
            domains_tracked,
            last_global_request,
        }
    }

    /// Forgets one domain's history, or everything when `domain` is `None`
    pub async fn reset(&self, domain: Option<&str>) {
        match domain {
            Some(domain) => {
                if self.domains.lock().await.remove(domain).is_some() {
                    info!(domain, "Rate limit reset for domain");
                }
            }
            None => {
                self.domains.lock().await.clear();
                self.global.lock().await.last_request_at = None;
                info!("Rate limiter fully reset");
            }
        }
    }

    async fn domain_slot(&self, domain: &str) -> Arc<Mutex<DomainState>> {
        let mut domains = self.domains.lock().await;
        Arc::clone(domains.entry(domain.to_string()).or_default())
    }
}
