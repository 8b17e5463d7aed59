use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Wrapper around the event channel sender handed to services and commands
#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Purchase order events
    PurchaseOrderCreated(Uuid),
    PurchaseOrderUpdated(Uuid),
    PurchaseOrderCancelled(Uuid),
    PurchaseOrderReceived {
        purchase_order_id: Uuid,
        fully_received: bool,
    },
    PurchaseOrderDeleted(Uuid),

    // Materials-to-order events
    MaterialsToOrderCreated(Uuid),
    MaterialsToOrderStatusChanged {
        materials_to_order_id: Uuid,
        old_status: String,
        new_status: String,
    },
    MaterialsToOrderClosed(Uuid),

    // Stock ledger events
    StockTransactionRecorded {
        transaction_id: Uuid,
        item_id: Uuid,
        quantity_delta: i32,
    },

    // Item events
    ItemCreated(Uuid),
    ItemUpdated(Uuid),
    ItemDeleted(Uuid),

    // Supplier events
    SupplierCreated(Uuid),
    SupplierUpdated(Uuid),
    SupplierDeleted(Uuid),

    // Vocabulary events
    ConfigValueCreated {
        category: String,
        value: String,
    },
}

// Function to process incoming events. Events are emitted after their
// transaction commits, so this loop only observes committed state.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match &event {
            Event::MaterialsToOrderStatusChanged {
                materials_to_order_id,
                old_status,
                new_status,
            } => {
                info!(
                    materials_to_order_id = %materials_to_order_id,
                    old_status = %old_status,
                    new_status = %new_status,
                    "Materials-to-order status changed"
                );
            }
            Event::PurchaseOrderReceived {
                purchase_order_id,
                fully_received,
            } => {
                info!(
                    purchase_order_id = %purchase_order_id,
                    fully_received = %fully_received,
                    "Purchase order stock received"
                );
            }
            Event::StockTransactionRecorded {
                transaction_id,
                item_id,
                quantity_delta,
            } => {
                info!(
                    transaction_id = %transaction_id,
                    item_id = %item_id,
                    quantity_delta = %quantity_delta,
                    "Stock transaction recorded"
                );
            }
            other => {
                info!("Received event: {:?}", other);
            }
        }
    }

    warn!("Event channel closed; stopping event processing loop");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn event_sender_delivers_to_receiver() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let id = Uuid::new_v4();
        sender.send(Event::PurchaseOrderCreated(id)).await.unwrap();

        match rx.recv().await {
            Some(Event::PurchaseOrderCreated(received)) => assert_eq!(received, id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn event_sender_reports_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender
            .send(Event::ItemCreated(Uuid::new_v4()))
            .await
            .is_err());
    }
}
