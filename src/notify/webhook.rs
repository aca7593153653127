use crate::notify::{Notifier, PriceDropEvent};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::warn;

/// JSON body posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    subject: String,
    message: String,
    event: &'a PriceDropEvent,
}

/// POSTs each alert as JSON to a fixed URL
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn notify(&self, event: &PriceDropEvent) -> bool {
        let payload = WebhookPayload {
            subject: event.subject(),
            message: event.message(),
            event,
        };

        let response = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => true,
            Ok(r) => {
                warn!(url = %self.url, status = r.status().as_u16(), "Webhook rejected alert");
                false
            }
            Err(e) => {
                warn!(url = %self.url, error = %e, "Webhook request failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> PriceDropEvent {
        PriceDropEvent::between(
            "kettle",
            Decimal::from(100),
            Decimal::from(90),
            "https://shop.example.com/kettle",
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_posts_json_event() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(body_partial_json(serde_json::json!({
                "subject": "Price drop: kettle",
                "event": { "product": "kettle", "url": "https://shop.example.com/kettle" }
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier =
            WebhookNotifier::new(reqwest::Client::new(), format!("{}/hook", server.uri()));
        assert!(notifier.notify(&event()).await);
    }

    #[tokio::test]
    async fn test_error_status_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = WebhookNotifier::new(reqwest::Client::new(), server.uri());
        assert!(!notifier.notify(&event()).await);
    }

    #[tokio::test]
    async fn test_unreachable_reports_failure() {
        let notifier = WebhookNotifier::new(reqwest::Client::new(), "http://127.0.0.1:9/hook")
            .with_timeout(Duration::from_millis(500));
        assert!(!notifier.notify(&event()).await);
    }
}
