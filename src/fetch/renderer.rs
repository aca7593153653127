//! Page rendering backends
//!
//! A `Renderer` turns a URL into HTML. The pipeline only depends on the trait;
//! `HttpRenderer` is the reqwest-backed implementation used by the binary.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, trace};

/// Interval between polls while waiting for a selector in dynamic mode
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Per-call rendering options
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Wait for client-side content before returning
    pub dynamic: bool,
    /// CSS selector that must be present when `dynamic` is set
    pub wait_selector: Option<String>,
    /// Upper bound for the whole render
    pub timeout: Duration,
    /// User agent sent with the request
    pub user_agent: String,
}

impl RenderOptions {
    /// Static render options with the given timeout and user agent
    pub fn static_page(timeout: Duration, user_agent: impl Into<String>) -> Self {
        Self {
            dynamic: false,
            wait_selector: None,
            timeout,
            user_agent: user_agent.into(),
        }
    }
}

/// Errors a renderer can report
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("HTTP status {status}")]
    Status { status: u16 },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Selector '{selector}' did not appear within {waited:?}")]
    SelectorTimeout { selector: String, waited: Duration },

    #[error("Failed to read response body: {0}")]
    Body(String),

    #[error("Invalid wait selector '{0}'")]
    InvalidSelector(String),
}

impl RenderError {
    /// Maps a reqwest error onto the renderer's error kinds
    pub fn from_reqwest(err: reqwest::Error, limit: Duration) -> Self {
        if err.is_timeout() {
            RenderError::Timeout(limit)
        } else if let Some(status) = err.status() {
            RenderError::Status {
                status: status.as_u16(),
            }
        } else if err.is_connect() || err.is_request() {
            RenderError::Connect(err.to_string())
        } else {
            RenderError::Body(err.to_string())
        }
    }
}

/// Produces the HTML of a page
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Renders `url` and returns its HTML
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError>;
}

/// Renderer backed by plain HTTP GET requests
///
/// In dynamic mode the page is re-fetched every 500 ms until the wait selector
/// is present in the returned HTML or the render timeout expires. This covers
/// sites that finish server-side rendering lazily; it does not execute
/// JavaScript.
#[derive(Debug, Clone)]
pub struct HttpRenderer {
    client: Client,
}

impl HttpRenderer {
    /// Builds a renderer with a fresh reqwest client
    ///
    /// # Returns
    ///
    /// * `Ok(HttpRenderer)` - Successfully built client
    /// * `Err(reqwest::Error)` - Failed to build client
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .gzip(true)
            .brotli(true)
            .build()?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &options.user_agent)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| RenderError::from_reqwest(e, options.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RenderError::Status {
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| RenderError::from_reqwest(e, options.timeout))
    }

    async fn render_dynamic(
        &self,
        url: &str,
        options: &RenderOptions,
        selector_text: &str,
    ) -> Result<String, RenderError> {
        let selector = Selector::parse(selector_text)
            .map_err(|_| RenderError::InvalidSelector(selector_text.to_string()))?;
        let started = Instant::now();

        let polled = timeout(options.timeout, async {
            loop {
                let body = self.get(url, options).await?;
                if contains_selector(&body, &selector) {
                    return Ok::<_, RenderError>(body);
                }
                trace!(url, selector = selector_text, "Wait selector not present yet");
                sleep(SELECTOR_POLL_INTERVAL).await;
            }
        })
        .await;

        match polled {
            Ok(result) => result,
            Err(_) => Err(RenderError::SelectorTimeout {
                selector: selector_text.to_string(),
                waited: started.elapsed(),
            }),
        }
    }
}

#[async_trait]
impl Renderer for HttpRenderer {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError> {
        debug!(url, dynamic = options.dynamic, "Rendering page");
        match (&options.dynamic, &options.wait_selector) {
            (true, Some(selector)) => self.render_dynamic(url, options, selector).await,
            _ => self.get(url, options).await,
        }
    }
}

/// Returns true if `html` contains at least one element matching `selector`
///
/// Kept synchronous: `scraper::Html` is not `Send` and must not live across an await.
fn contains_selector(html: &str, selector: &Selector) -> bool {
    Html::parse_document(html).select(selector).next().is_some()
}

/// True for statuses the pipeline treats as caller mistakes
pub fn is_client_status(status: u16) -> bool {
    StatusCode::from_u16(status)
        .map(|s| s.is_client_error())
        .unwrap_or(false)
}
