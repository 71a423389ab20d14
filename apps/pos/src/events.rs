//! # Event Bus
//!
//! Typed application events fanned out over a `tokio::sync::broadcast`
//! channel. Commands publish after a successful change; views subscribe to
//! refresh themselves.
//!
//! ```text
//! commands::tare::add_tare ──► TareCatalogChanged ─┐
//! commands::weighing::weigh ─► WeighedLineAdded ───┤
//! commands::inventory ───────► StockChanged ───────┼──► broadcast ──► subscribers
//! commands::order::commit ───► OrderCommitted ─────┘
//! ```

use bascula_core::{Kilograms, OrderLine};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered events per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    /// A tare was added, edited or removed.
    TareCatalogChanged,
    /// A line was appended to the order draft.
    WeighedLineAdded { line: OrderLine },
    /// A product's stock level changed.
    StockChanged { product_id: String, stock: Kilograms },
    /// An order was persisted.
    OrderCommitted { order_id: String, folio: String },
}

#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        EventBus { sender }
    }

    /// Sends to current subscribers. Returns how many received it; zero
    /// subscribers is fine.
    pub fn publish(&self, event: AppEvent) -> usize {
        trace!(?event, "publish");
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(AppEvent::TareCatalogChanged), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_typed_payloads() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(AppEvent::StockChanged {
            product_id: "p-1".to_string(),
            stock: Kilograms::new(dec!(7.5)),
        });

        match rx.recv().await.unwrap() {
            AppEvent::StockChanged { product_id, stock } => {
                assert_eq!(product_id, "p-1");
                assert_eq!(stock.value(), dec!(7.5));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(AppEvent::OrderCommitted {
            order_id: "o-1".to_string(),
            folio: "20261017-0001".to_string(),
        })
        .unwrap();
        assert_eq!(json["type"], "order_committed");
        assert_eq!(json["folio"], "20261017-0001");
    }
}
