//! In-process message broker with batched, at-least-once delivery.
//!
//! Messages are collected into batches bounded by size and wait time, handed
//! to a [`BatchHandler`], and redelivered on failure until the retry budget
//! is spent. Exhausted messages are routed to the dead-letter channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics::{BATCHES_DELIVERED, BATCH_SIZE, MESSAGES_DEAD_LETTERED, MESSAGES_RETRIED};

use super::{BatchHandler, Delivery, OrderMessage, QueueConfig, QueueError};

/// Buffer size for the main delivery channel.
const QUEUE_BUFFER: usize = 1024;

/// Buffer size for the dead-letter channel.
const DEAD_LETTER_BUFFER: usize = 256;

/// Producer side of the queue.
///
/// Cheaply cloneable; the gateway holds one and enqueues a message per
/// accepted order.
#[derive(Clone)]
pub struct QueueProducer {
    tx: mpsc::Sender<Delivery>,
}

impl QueueProducer {
    /// Enqueue a message for fulfillment.
    pub async fn send(&self, message: OrderMessage) -> Result<(), QueueError> {
        self.tx
            .send(Delivery {
                message,
                attempt: 1,
            })
            .await
            .map_err(|_| QueueError::Closed)
    }
}

/// Background task that delivers batches to the handler.
pub struct QueueRunner {
    config: QueueConfig,
    handler: Arc<dyn BatchHandler>,
    rx: mpsc::Receiver<Delivery>,
    dead_letter_tx: mpsc::Sender<Delivery>,
}

/// Create a complete queue.
///
/// Returns:
/// - `QueueProducer` - for enqueueing messages (clone to share across tasks)
/// - `QueueRunner` - spawn with `tokio::spawn(runner.run())`
/// - dead-letter receiver - feed to a [`super::DeadLetterHandler`]
pub fn create_queue(
    config: QueueConfig,
    handler: Arc<dyn BatchHandler>,
) -> (QueueProducer, QueueRunner, mpsc::Receiver<Delivery>) {
    let (tx, rx) = mpsc::channel(QUEUE_BUFFER);
    let (dead_letter_tx, dead_letter_rx) = mpsc::channel(DEAD_LETTER_BUFFER);

    let producer = QueueProducer { tx };
    let runner = QueueRunner {
        config,
        handler,
        rx,
        dead_letter_tx,
    };

    (producer, runner, dead_letter_rx)
}

impl QueueRunner {
    /// Run the broker loop until all producers are dropped and every pending
    /// redelivery has settled.
    pub async fn run(mut self) {
        info!(
            "Queue runner started (batch size {}, wait {}ms, {} retries)",
            self.config.max_batch_size, self.config.max_batch_wait_ms, self.config.max_retries
        );

        // Failed messages are carried into the next batch instead of being
        // pushed back through the channel, so the runner never blocks on its
        // own redeliveries.
        let mut carryover: Vec<Delivery> = Vec::new();

        loop {
            let mut batch = std::mem::take(&mut carryover);

            if batch.is_empty() {
                match self.rx.recv().await {
                    Some(delivery) => batch.push(delivery),
                    None => break,
                }
            }

            let deadline = Instant::now() + Duration::from_millis(self.config.max_batch_wait_ms);
            while batch.len() < self.config.max_batch_size {
                match tokio::time::timeout_at(deadline, self.rx.recv()).await {
                    Ok(Some(delivery)) => batch.push(delivery),
                    Ok(None) | Err(_) => break,
                }
            }

            BATCHES_DELIVERED.inc();
            BATCH_SIZE.observe(batch.len() as f64);
            debug!("Delivering batch of {} message(s)", batch.len());

            let outcome = self.handler.handle_batch(&batch).await;

            for &index in outcome.retries() {
                let Some(delivery) = batch.get(index) else {
                    warn!("Batch outcome referenced out-of-range index {}", index);
                    continue;
                };

                let next = Delivery {
                    message: delivery.message.clone(),
                    attempt: delivery.attempt + 1,
                };

                if next.attempt > self.config.max_retries + 1 {
                    warn!(
                        "Order {} exhausted {} attempts, routing to {}",
                        next.message.order_id, delivery.attempt, self.config.dead_letter_name
                    );
                    MESSAGES_DEAD_LETTERED.inc();
                    if self.dead_letter_tx.send(next).await.is_err() {
                        warn!("Dead-letter channel closed, dropping message");
                    }
                } else {
                    debug!(
                        "Scheduling redelivery of order {} (attempt {})",
                        next.message.order_id, next.attempt
                    );
                    MESSAGES_RETRIED.inc();
                    carryover.push(next);
                }
            }
        }

        info!("Queue runner shutting down");
    }
}
