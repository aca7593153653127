//! Polite page fetching
//!
//! This module drives one page fetch through every politeness gate:
//! - Picking the user agent for the request
//! - Checking robots.txt permission
//! - Honoring Crawl-delay and the configured request spacing
//! - Retrying transient render failures with backoff

use crate::fetch::{is_client_status, RenderError, RenderOptions, Renderer, UserAgentPool};
use crate::ratelimit::RateLimiter;
use crate::recipe::ExtractionRecipe;
use crate::retry::{Classify, FailureClass, RetryError, RetryPolicy};
use crate::robots::DomainPolicy;
use crate::url::domain_base;
use crate::{Result, SentinelError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// One page to fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: Url,
    pub use_dynamic_rendering: bool,
    pub wait_selector: Option<String>,
    pub timeout: Duration,
}

impl FetchRequest {
    /// Plain static fetch
    pub fn new(url: Url, timeout: Duration) -> Self {
        Self {
            url,
            use_dynamic_rendering: false,
            wait_selector: None,
            timeout,
        }
    }

    /// Fetch shaped by a recipe's rendering options
    pub fn for_recipe(url: Url, recipe: &ExtractionRecipe, timeout: Duration) -> Self {
        Self {
            url,
            use_dynamic_rendering: recipe.options().dynamic,
            wait_selector: recipe.wait_selector().map(str::to_string),
            timeout,
        }
    }

    fn render_options(&self, user_agent: &str) -> RenderOptions {
        RenderOptions {
            dynamic: self.use_dynamic_rendering,
            wait_selector: self.wait_selector.clone(),
            timeout: self.timeout,
            user_agent: user_agent.to_string(),
        }
    }
}

impl Classify for RenderError {
    fn classify(&self) -> FailureClass {
        match self {
            RenderError::Status { status } if is_client_status(*status) => FailureClass::Client,
            RenderError::Status { .. }
            | RenderError::Timeout(_)
            | RenderError::Connect(_)
            | RenderError::SelectorTimeout { .. } => FailureClass::Transient,
            RenderError::InvalidSelector(_) => FailureClass::Client,
            RenderError::Body(_) => FailureClass::Unclassified,
        }
    }
}

/// Fetches page HTML while respecting robots.txt, rate limits and retry budget
///
/// The policy, limiter and agent pool are shared handles so several fetchers
/// (or several tasks holding one fetcher) observe the same spacing.
#[derive(Clone)]
pub struct ContentFetcher {
    renderer: Arc<dyn Renderer>,
    policy: Arc<DomainPolicy>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    agents: Arc<UserAgentPool>,
}

impl ContentFetcher {
    /// Creates a fetcher from its collaborators
    ///
    /// # Arguments
    ///
    /// * `renderer` - Backend that turns a URL into HTML
    /// * `policy` - robots.txt gate
    /// * `limiter` - Request spacing
    /// * `retry` - Backoff policy around each render
    /// * `agents` - User agent rotation
    pub fn new(
        renderer: Arc<dyn Renderer>,
        policy: Arc<DomainPolicy>,
        limiter: Arc<RateLimiter>,
        retry: RetryPolicy,
        agents: Arc<UserAgentPool>,
    ) -> Self {
        Self {
            renderer,
            policy,
            limiter,
            retry,
            agents,
        }
    }

    pub fn policy(&self) -> &Arc<DomainPolicy> {
        &self.policy
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Fetches the page described by `request`
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The page HTML
    /// * `Err(SentinelError::RobotsDisallowed)` - robots.txt forbids the URL
    /// * `Err(SentinelError::ClientError)` - A 4xx response, not retried
    /// * `Err(SentinelError::RetryExhausted)` - Every attempt failed
    pub async fn fetch(&self, request: &FetchRequest) -> Result<String> {
        self.fetch_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Like [`fetch`](Self::fetch), aborting when `cancel` fires
    ///
    /// Cancellation is observed during the render call and each backoff sleep.
    pub async fn fetch_with_cancel(
        &self,
        request: &FetchRequest,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let url = &request.url;
        let user_agent = self.agents.next_agent();

        if !self.policy.can_fetch(url, user_agent).await {
            return Err(SentinelError::RobotsDisallowed {
                url: url.to_string(),
            });
        }

        let crawl_delay = self.policy.crawl_delay(url, user_agent).await;
        let domain = domain_base(url)?;
        self.limiter.wait_if_needed(&domain, crawl_delay).await;

        let options = request.render_options(user_agent);
        debug!(
            url = %url,
            dynamic = options.dynamic,
            user_agent,
            "Fetching page"
        );

        let result = self
            .retry
            .execute_with_retry_cancellable(|| self.renderer.render(url.as_str(), &options), cancel)
            .await;

        match result {
            Ok(html) => {
                info!(url = %url, bytes = html.len(), "Fetched page");
                Ok(html)
            }
            Err(RetryError::NonRetryable(source)) => Err(SentinelError::ClientError {
                url: url.to_string(),
                source,
            }),
            Err(RetryError::Exhausted { attempts, last }) => Err(SentinelError::RetryExhausted {
                url: url.to_string(),
                attempts,
                source: last,
            }),
            Err(RetryError::Cancelled { attempts }) => Err(SentinelError::Cancelled {
                url: url.to_string(),
                attempts,
            }),
        }
    }
}
