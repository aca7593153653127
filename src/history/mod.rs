//! Price history comparison
//!
//! Compares a fresh price against the last one stored for the same product and
//! raises a [`PriceDropEvent`] when the price fell by at least one percent.

use crate::notify::{NotificationDispatcher, PriceDropEvent};
use crate::storage::PriceStore;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Minimum drop, in percent, that counts as a price drop
pub const DROP_THRESHOLD_PCT: Decimal = Decimal::ONE;

/// Emits drop alerts against stored history
#[derive(Clone, Default)]
pub struct PriceHistoryGate {
    dispatcher: NotificationDispatcher,
}

impl PriceHistoryGate {
    pub fn new(dispatcher: NotificationDispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &NotificationDispatcher {
        &self.dispatcher
    }

    /// Compares `current_price` with the last stored price for `product_key`
    ///
    /// The store lock is released before any notifier runs. Read failures are
    /// logged and treated as "no history".
    ///
    /// # Arguments
    ///
    /// * `store` - Shared price store
    /// * `product_key` - Key the history is tracked under
    /// * `current_price` - Freshly extracted price
    /// * `url` - Page the price came from
    ///
    /// # Returns
    ///
    /// * `Some(PriceDropEvent)` - The price dropped by at least the threshold
    /// * `None` - No history, no drop, or a drop below the threshold
    pub async fn check_and_notify(
        &self,
        store: &Mutex<dyn PriceStore + Send>,
        product_key: &str,
        current_price: Decimal,
        url: &str,
    ) -> Option<PriceDropEvent> {
        let latest = {
            let store = store.lock().await;
            store.latest(product_key, 1)
        };

        let previous = match latest {
            Ok(records) => records.into_iter().next()?.price?,
            Err(e) => {
                warn!(product = %product_key, error = %e, "Could not read price history");
                return None;
            }
        };

        let event = PriceDropEvent::between(product_key, previous, current_price, url)?;
        if event.drop_pct < DROP_THRESHOLD_PCT {
            debug!(
                product = %product_key,
                drop_pct = %event.drop_pct.round_dp(2),
                "Price change below alert threshold"
            );
            return None;
        }

        info!(
            product = %product_key,
            previous = %previous,
            current = %current_price,
            "Price drop detected"
        );
        self.dispatcher.dispatch(&event).await;
        Some(event)
    }
}
