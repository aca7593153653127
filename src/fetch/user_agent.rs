use crate::config::UserAgentConfig;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Round-robin source of user agent strings
///
/// With no `rotate` list configured the pool holds only the crawler identity,
/// `Name/Version (+ContactURL; ContactEmail)`, so every request is attributable.
#[derive(Debug)]
pub struct UserAgentPool {
    agents: Vec<String>,
    cursor: AtomicUsize,
}

impl UserAgentPool {
    /// Builds the pool from user agent configuration
    pub fn from_config(config: &UserAgentConfig) -> Self {
        if config.rotate.is_empty() {
            Self::single(config.identity())
        } else {
            Self::new(config.rotate.clone()).unwrap_or_else(|| Self::single(config.identity()))
        }
    }

    /// Pool over the given agents, `None` if the list is empty
    pub fn new(agents: Vec<String>) -> Option<Self> {
        if agents.is_empty() {
            return None;
        }
        Some(Self {
            agents,
            cursor: AtomicUsize::new(0),
        })
    }

    /// Pool that always yields `agent`
    pub fn single(agent: impl Into<String>) -> Self {
        Self {
            agents: vec![agent.into()],
            cursor: AtomicUsize::new(0),
        }
    }

    /// Returns the next agent in rotation
    pub fn next_agent(&self) -> &str {
        let i = self.cursor.fetch_add(1, Ordering::Relaxed) % self.agents.len();
        &self.agents[i]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}
