use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Events emitted by the shop services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ProductViewed {
        product_id: Uuid,
        user_id: Option<Uuid>,
    },
    CartItemAdded {
        user_id: Uuid,
        offer_id: Uuid,
    },
    CartItemRemoved {
        user_id: Uuid,
        offer_id: Uuid,
    },
    CartQuantityChanged {
        user_id: Uuid,
        offer_id: Uuid,
        quantity: i32,
    },
    CompareListChanged {
        session_id: String,
        size: usize,
    },
    ReviewCreated {
        product_id: Uuid,
        review_id: Uuid,
    },
}

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

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Event delivery is best effort and never blocks the caller's success path.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            error!("Event dropped: {}", e);
        }
    }
}

/// Drains the event channel, logging each event as it arrives.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::ProductViewed {
                product_id,
                user_id,
            } => {
                debug!(%product_id, ?user_id, "Product viewed");
            }
            Event::CartItemAdded { user_id, offer_id } => {
                info!(%user_id, %offer_id, "Cart item added");
            }
            Event::CartItemRemoved { user_id, offer_id } => {
                info!(%user_id, %offer_id, "Cart item removed");
            }
            Event::CartQuantityChanged {
                user_id,
                offer_id,
                quantity,
            } => {
                info!(%user_id, %offer_id, quantity, "Cart quantity changed");
            }
            Event::CompareListChanged { session_id, size } => {
                debug!(%session_id, size, "Comparison list changed");
            }
            Event::ReviewCreated {
                product_id,
                review_id,
            } => {
                info!(%product_id, %review_id, "Review created");
            }
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_delivers_event() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);

        sender
            .send(Event::CartItemAdded {
                user_id: Uuid::new_v4(),
                offer_id: Uuid::new_v4(),
            })
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(Event::CartItemAdded { .. })
        ));
    }

    #[tokio::test]
    async fn send_or_log_swallows_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);

        // Must not panic or error out
        sender
            .send_or_log(Event::CompareListChanged {
                session_id: "s-1".into(),
                size: 2,
            })
            .await;
    }
}
