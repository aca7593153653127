use crate::notify::{Notifier, PriceDropEvent};
use async_trait::async_trait;
use tracing::info;

/// Writes alerts to the log and to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for ConsoleNotifier {
    fn name(&self) -> &str {
        "console"
    }

    async fn notify(&self, event: &PriceDropEvent) -> bool {
        info!(
            product = %event.product,
            previous = %event.previous_price,
            current = %event.current_price,
            drop_pct = %event.drop_pct.round_dp(1),
            "Price drop alert"
        );
        println!("\nALERT [{}]\n{}\n", event.subject(), event.message());
        true
    }
}
