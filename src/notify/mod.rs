//! Price drop notifications
//!
//! A [`Notifier`] delivers one [`PriceDropEvent`] to one sink. The
//! [`NotificationDispatcher`] fans an event out to every configured sink and
//! never lets a failing sink affect the others or the caller.

mod console;
mod webhook;

pub use console::ConsoleNotifier;
pub use webhook::WebhookNotifier;

use crate::config::NotifyConfig;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// A tracked product became cheaper
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceDropEvent {
    pub product: String,
    pub previous_price: Decimal,
    pub current_price: Decimal,
    pub url: String,
    /// Drop relative to the previous price, in percent
    pub drop_pct: Decimal,
}

impl PriceDropEvent {
    /// Builds an event, computing `drop_pct` from the two prices
    ///
    /// Returns `None` unless `current < previous` and `previous > 0`.
    pub fn between(
        product: impl Into<String>,
        previous_price: Decimal,
        current_price: Decimal,
        url: impl Into<String>,
    ) -> Option<Self> {
        if previous_price <= Decimal::ZERO || current_price >= previous_price {
            return None;
        }
        let drop_pct = (previous_price - current_price) / previous_price * Decimal::ONE_HUNDRED;
        Some(Self {
            product: product.into(),
            previous_price,
            current_price,
            url: url.into(),
            drop_pct,
        })
    }

    /// One-line alert subject
    pub fn subject(&self) -> String {
        format!("Price drop: {}", self.product)
    }

    /// Human-readable alert body
    pub fn message(&self) -> String {
        format!(
            "'{}' dropped {}%\nBefore: {}\nNow: {}\nLink: {}",
            self.product,
            self.drop_pct.round_dp(1),
            self.previous_price,
            self.current_price,
            self.url
        )
    }
}

/// A notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short sink name for logs
    fn name(&self) -> &str;

    /// Delivers the event; returns false if delivery failed
    async fn notify(&self, event: &PriceDropEvent) -> bool;
}

/// Sends events to every registered notifier
#[derive(Clone, Default)]
pub struct NotificationDispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the sinks named in the configuration
    pub fn from_config(config: &NotifyConfig, client: reqwest::Client) -> Self {
        let mut dispatcher = Self::new();
        if config.console {
            dispatcher.add(Arc::new(ConsoleNotifier::new()));
        }
        if let Some(url) = &config.webhook_url {
            dispatcher.add(Arc::new(WebhookNotifier::new(client, url.clone())));
        }
        dispatcher
    }

    pub fn add(&mut self, notifier: Arc<dyn Notifier>) {
        self.notifiers.push(notifier);
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    /// Delivers to every sink, returning how many succeeded
    pub async fn dispatch(&self, event: &PriceDropEvent) -> usize {
        let mut delivered = 0;
        for notifier in &self.notifiers {
            if notifier.notify(event).await {
                debug!(sink = notifier.name(), product = %event.product, "Notification sent");
                delivered += 1;
            } else {
                error!(sink = notifier.name(), product = %event.product, "Notification failed");
            }
        }
        delivered
    }
}
