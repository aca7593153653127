use crate::fetch::{RenderOptions, Renderer};
use crate::robots::{CachedRobots, ParsedRobots};
use crate::url::domain_base;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};
use url::Url;

/// Default upper bound for a honoured Crawl-delay
pub const DEFAULT_MAX_CRAWL_DELAY: Duration = Duration::from_secs(60);

/// Per-domain fetch permission and crawl delay
///
/// robots.txt is requested once per `scheme://host[:port]` base and cached for
/// the lifetime of the policy. Concurrent first callers for the same base share
/// a single fetch. Any failure to obtain robots.txt is treated as allow-all.
pub struct DomainPolicy {
    renderer: Arc<dyn Renderer>,
    timeout: Duration,
    max_crawl_delay: Duration,
    enabled: bool,
    cache: Mutex<HashMap<String, Arc<OnceCell<CachedRobots>>>>,
}

impl DomainPolicy {
    /// Creates a policy that fetches robots.txt through `renderer`
    ///
    /// # Arguments
    ///
    /// * `renderer` - Backend used for the static robots.txt GET
    /// * `timeout` - Upper bound for each robots.txt retrieval
    pub fn new(renderer: Arc<dyn Renderer>, timeout: Duration) -> Self {
        Self {
            renderer,
            timeout,
            max_crawl_delay: DEFAULT_MAX_CRAWL_DELAY,
            enabled: true,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Caps the Crawl-delay a site can impose
    pub fn with_max_crawl_delay(mut self, max: Duration) -> Self {
        self.max_crawl_delay = max;
        self
    }

    /// Creates a policy that allows every URL without fetching anything
    pub fn disabled(renderer: Arc<dyn Renderer>) -> Self {
        Self {
            enabled: false,
            ..Self::new(renderer, Duration::ZERO)
        }
    }

    /// Checks whether `url` may be fetched by `user_agent`
    pub async fn can_fetch(&self, url: &Url, user_agent: &str) -> bool {
        let Some(robots) = self.resolve(url, user_agent).await else {
            return true;
        };

        let allowed = robots.is_allowed(url.as_str(), user_agent);
        if allowed {
            debug!(url = %url, "robots.txt allows fetch");
        } else {
            warn!(url = %url, user_agent, "robots.txt disallows fetch");
        }
        allowed
    }

    /// Returns the Crawl-delay that applies to `user_agent`, if any
    ///
    /// Values above the configured maximum are clamped to it.
    pub async fn crawl_delay(&self, url: &Url, user_agent: &str) -> Option<Duration> {
        let delay = self.resolve(url, user_agent).await?.crawl_delay(user_agent)?;
        if delay > self.max_crawl_delay {
            warn!(
                url = %url,
                requested_secs = delay.as_secs_f64(),
                max_secs = self.max_crawl_delay.as_secs_f64(),
                "Crawl-delay exceeds the configured maximum, clamping"
            );
            return Some(self.max_crawl_delay);
        }
        debug!(url = %url, delay_secs = delay.as_secs_f64(), "Crawl-delay in effect");
        Some(delay)
    }

    /// Number of domain bases with a resolved robots entry
    pub async fn cached_domains(&self) -> usize {
        let cache = self.cache.lock().await;
        cache.values().filter(|cell| cell.initialized()).count()
    }

    /// Resolves the cached entry for the url's base, fetching it on first use
    async fn resolve(&self, url: &Url, user_agent: &str) -> Option<CachedRobots> {
        if !self.enabled {
            return None;
        }

        let base = match domain_base(url) {
            Ok(base) => base,
            Err(e) => {
                warn!(url = %url, error = %e, "Cannot derive robots.txt location, allowing");
                return None;
            }
        };

        let cell = {
            let mut cache = self.cache.lock().await;
            Arc::clone(cache.entry(base.clone()).or_default())
        };

        let robots = cell
            .get_or_init(|| self.fetch_robots(&base, user_agent))
            .await;
        Some(robots.clone())
    }

    async fn fetch_robots(&self, base: &str, user_agent: &str) -> CachedRobots {
        let robots_url = format!("{}/robots.txt", base);
        debug!(robots_url = %robots_url, "Fetching robots.txt");

        let options = RenderOptions::static_page(self.timeout, user_agent);
        let result =
            tokio::time::timeout(self.timeout, self.renderer.render(&robots_url, &options)).await;

        match result {
            Ok(Ok(body)) => {
                info!(base, "Loaded robots.txt");
                CachedRobots::new(ParsedRobots::from_content(&body))
            }
            Ok(Err(e)) => {
                warn!(
                    robots_url = %robots_url,
                    error = %e,
                    "Could not read robots.txt, assuming allowed"
                );
                CachedRobots::permissive()
            }
            Err(_) => {
                warn!(
                    robots_url = %robots_url,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "robots.txt request timed out, assuming allowed"
                );
                CachedRobots::permissive()
            }
        }
    }
}
