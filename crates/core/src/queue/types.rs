//! Queue message and batch types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::order::OrderItem;

/// Error type for queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue runner has shut down and no longer accepts messages.
    #[error("queue is closed")]
    Closed,
}

/// A fulfillment request as it travels through the queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderMessage {
    pub order_id: String,
    pub customer_name: String,
    pub item_descriptor: OrderItem,
    pub timestamp: DateTime<Utc>,
}

/// A message together with its delivery bookkeeping.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub message: OrderMessage,
    /// 1-based attempt number; incremented on each redelivery.
    pub attempt: u32,
}

/// Outcome of handling one batch.
///
/// Handlers report the indexes of messages that should be redelivered;
/// everything else is considered acknowledged. This keeps one message's
/// failure from affecting its siblings in the same batch.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    retry: Vec<usize>,
}

impl BatchOutcome {
    /// An outcome with every message acknowledged.
    pub fn all_ok() -> Self {
        Self::default()
    }

    /// Mark the message at `index` for redelivery.
    pub fn mark_retry(&mut self, index: usize) {
        self.retry.push(index);
    }

    /// Indexes of messages to redeliver.
    pub fn retries(&self) -> &[usize] {
        &self.retry
    }

    /// True when no message needs redelivery.
    pub fn is_clean(&self) -> bool {
        self.retry.is_empty()
    }
}

/// Consumer side of the queue.
///
/// Implementations receive whole batches and must not panic on individual
/// message failures; report them through the outcome instead.
#[async_trait]
pub trait BatchHandler: Send + Sync {
    async fn handle_batch(&self, batch: &[Delivery]) -> BatchOutcome;
}
