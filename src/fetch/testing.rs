//! In-memory renderer for unit tests

use crate::fetch::{RenderError, RenderOptions, Renderer};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Replies from per-URL scripts; the last reply of a script repeats forever
///
/// Unknown URLs answer 404, which also makes robots.txt permissive.
#[derive(Default)]
pub struct ScriptedRenderer {
    routes: Mutex<HashMap<String, VecDeque<Result<String, u16>>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`
    pub fn page(self, url: &str, body: &str) -> Self {
        self.script(url, vec![Ok(body.to_string())])
    }

    /// Serves the given replies for `url` in order
    pub fn script(self, url: &str, replies: Vec<Result<String, u16>>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), replies.into());
        self
    }

    /// Number of render calls made for `url`
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .count()
    }

    /// User agents sent, in call order
    pub fn user_agents(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, ua)| ua.clone())
            .collect()
    }
}

#[async_trait]
impl Renderer for ScriptedRenderer {
    async fn render(&self, url: &str, options: &RenderOptions) -> Result<String, RenderError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), options.user_agent.clone()));

        let mut routes = self.routes.lock().unwrap();
        let reply = match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        };

        match reply {
            Some(Ok(body)) => Ok(body),
            Some(Err(status)) => Err(RenderError::Status { status }),
            None => Err(RenderError::Status { status: 404 }),
        }
    }
}
