//! Dead-letter handling.
//!
//! Messages that exhaust their retry budget would otherwise leave their
//! orders stuck in `preparing` forever. This handler drains the dead-letter
//! channel and settles each affected order as `cancelled`.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::order::OrderStore;

use super::Delivery;

/// Background task that settles dead-lettered orders.
pub struct DeadLetterHandler {
    rx: mpsc::Receiver<Delivery>,
    store: Arc<dyn OrderStore>,
    queue_name: String,
}

impl DeadLetterHandler {
    /// Create a new dead-letter handler.
    pub fn new(rx: mpsc::Receiver<Delivery>, store: Arc<dyn OrderStore>, queue_name: impl Into<String>) -> Self {
        Self {
            rx,
            store,
            queue_name: queue_name.into(),
        }
    }

    /// Run the handler, consuming messages until the channel is closed.
    ///
    /// This should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Dead-letter handler started for {}", self.queue_name);

        while let Some(delivery) = self.rx.recv().await {
            let order_id = &delivery.message.order_id;
            warn!(
                "Order {} reached {} after {} attempts, cancelling",
                order_id, self.queue_name, delivery.attempt
            );

            match self.store.cancel(order_id, Utc::now()) {
                Ok(order) => {
                    info!("Order {} settled as {}", order_id, order.status.as_str());
                }
                Err(e) => {
                    error!("Failed to cancel dead-lettered order {}: {}", order_id, e);
                }
            }
        }

        info!("Dead-letter handler shutting down");
    }
}
