//! Fetching module for Price Sentinel
//!
//! This module turns URLs into HTML:
//! - `Renderer`: the rendering backend seam, with the reqwest-backed `HttpRenderer`
//! - `UserAgentPool`: user agent rotation
//! - `ContentFetcher`: robots.txt, rate limiting and retry around each render

mod fetcher;
mod renderer;
mod user_agent;

#[cfg(test)]
pub(crate) mod testing;

pub use fetcher::{ContentFetcher, FetchRequest};
pub use renderer::{is_client_status, HttpRenderer, RenderError, RenderOptions, Renderer};
pub use user_agent::UserAgentPool;
