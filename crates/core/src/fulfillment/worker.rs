//! The fulfillment worker.
//!
//! Consumes order message batches and drives each order through
//! `pending → preparing → completed`, or to `cancelled` when the fulfillment
//! action raises. Store writes on the primary transition are authoritative;
//! the cancellation write and every counter call are best-effort.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use crate::counter::CounterHandle;
use crate::metrics::{FULFILLMENT_ATTEMPTS, FULFILLMENT_DURATION};
use crate::order::{OrderStatus, OrderStore};
use crate::queue::{BatchHandler, BatchOutcome, Delivery};

use super::{FulfillmentAction, FulfillmentError};

/// Batch consumer that executes the order lifecycle.
pub struct FulfillmentWorker {
    store: Arc<dyn OrderStore>,
    action: Arc<dyn FulfillmentAction>,
    counter: Option<CounterHandle>,
}

impl FulfillmentWorker {
    /// Create a new worker.
    pub fn new(store: Arc<dyn OrderStore>, action: Arc<dyn FulfillmentAction>) -> Self {
        Self {
            store,
            action,
            counter: None,
        }
    }

    /// Attach the counter handle used for completion increments.
    pub fn with_counter(mut self, counter: CounterHandle) -> Self {
        self.counter = Some(counter);
        self
    }

    /// Run one fulfillment cycle for a single message.
    ///
    /// An `Err` means the attempt failed and the message should be
    /// redelivered under the queue's retry policy.
    async fn process_message(&self, delivery: &Delivery) -> Result<(), FulfillmentError> {
        let order_id = &delivery.message.order_id;

        let order = self.store.begin_preparing(order_id, Utc::now())?;
        if order.status == OrderStatus::Completed {
            // At-least-once delivery: this order already finished on an
            // earlier attempt. Acknowledge without side effects.
            debug!(
                "Order {} already completed, ignoring redelivery (attempt {})",
                order_id, delivery.attempt
            );
            FULFILLMENT_ATTEMPTS.with_label_values(&["duplicate"]).inc();
            return Ok(());
        }

        if let Err(action_err) = self.action.fulfill(&delivery.message).await {
            // Best-effort cancellation write; the action error is what the
            // queue layer must see.
            if let Err(store_err) = self.store.cancel(order_id, Utc::now()) {
                warn!(
                    "Failed to record cancellation for order {}: {}",
                    order_id, store_err
                );
            }
            FULFILLMENT_ATTEMPTS.with_label_values(&["cancelled"]).inc();
            return Err(action_err);
        }

        let newly_completed = self.store.complete(order_id, Utc::now())?;

        if newly_completed {
            FULFILLMENT_ATTEMPTS.with_label_values(&["completed"]).inc();
            if let Some(ref counter) = self.counter {
                // Best-effort: a counter failure never fails the order.
                if let Err(e) = counter.increment_completed().await {
                    warn!("Counter update failed for order {}: {}", order_id, e);
                }
            }
        } else {
            debug!(
                "Order {} completed by a concurrent attempt, skipping counter update",
                order_id
            );
            FULFILLMENT_ATTEMPTS.with_label_values(&["duplicate"]).inc();
        }

        Ok(())
    }
}

#[async_trait]
impl BatchHandler for FulfillmentWorker {
    async fn handle_batch(&self, batch: &[Delivery]) -> BatchOutcome {
        let mut outcome = BatchOutcome::all_ok();

        for (index, delivery) in batch.iter().enumerate() {
            let started = Instant::now();
            match self.process_message(delivery).await {
                Ok(()) => {
                    FULFILLMENT_DURATION
                        .with_label_values(&["ok"])
                        .observe(started.elapsed().as_secs_f64());
                }
                Err(e) => {
                    FULFILLMENT_DURATION
                        .with_label_values(&["error"])
                        .observe(started.elapsed().as_secs_f64());
                    warn!(
                        "Fulfillment attempt {} for order {} failed: {}",
                        delivery.attempt, delivery.message.order_id, e
                    );
                    outcome.mark_retry(index);
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::counter::{create_counter, CounterStore};
    use crate::order::{CreateOrderRequest, OrderItem};
    use crate::queue::OrderMessage;
    use crate::testing::{MemoryCounterStore, MemoryOrderStore, ScriptedFulfillment};

    fn create_order(store: &MemoryOrderStore, customer: &str) -> String {
        store
            .create(CreateOrderRequest {
                customer_name: customer.to_string(),
                item: OrderItem::new("latte", "medium"),
                price_cents: 450,
                estimated_time: "5-10 minutes".to_string(),
            })
            .unwrap()
            .id
    }

    fn delivery(order_id: &str, attempt: u32) -> Delivery {
        Delivery {
            message: OrderMessage {
                order_id: order_id.to_string(),
                customer_name: "Alice".to_string(),
                item_descriptor: OrderItem::new("latte", "medium"),
                timestamp: Utc::now(),
            },
            attempt,
        }
    }

    #[tokio::test]
    async fn test_successful_cycle_reaches_completed() {
        let store = Arc::new(MemoryOrderStore::new());
        let order_id = create_order(&store, "Alice");

        let worker = FulfillmentWorker::new(
            store.clone(),
            Arc::new(ScriptedFulfillment::new()),
        );

        let outcome = worker.handle_batch(&[delivery(&order_id, 1)]).await;
        assert!(outcome.is_clean());

        let order = store.get(&order_id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
        assert!(order.processed_at.is_some());
        assert!(order.completed_at.is_some());
        assert!(order.processed_at.unwrap() <= order.completed_at.unwrap());
    }

    #[tokio::test]
    async fn test_action_failure_cancels_and_requests_retry() {
        let store = Arc::new(MemoryOrderStore::new());
        let order_id = create_order(&store, "Bob");

        let action = ScriptedFulfillment::new();
        action.fail_always(&order_id);
        let worker = FulfillmentWorker::new(store.clone(), Arc::new(action));

        let outcome = worker.handle_batch(&[delivery(&order_id, 1)]).await;
        assert_eq!(outcome.retries(), &[0]);

        let order = store.get(&order_id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(order.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_one_failure_does_not_abort_siblings() {
        let store = Arc::new(MemoryOrderStore::new());
        let bad = create_order(&store, "Bob");
        let good = create_order(&store, "Alice");

        let action = ScriptedFulfillment::new();
        action.fail_always(&bad);
        let worker = FulfillmentWorker::new(store.clone(), Arc::new(action));

        let outcome = worker
            .handle_batch(&[delivery(&bad, 1), delivery(&good, 1)])
            .await;
        assert_eq!(outcome.retries(), &[0]);

        assert_eq!(
            store.get(&good).unwrap().unwrap().status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_redelivery_completes_once_and_increments_once() {
        let store = Arc::new(MemoryOrderStore::new());
        let order_id = create_order(&store, "Alice");

        let counter_store = Arc::new(MemoryCounterStore::new()) as Arc<dyn CounterStore>;
        let (handle, actor) = create_counter("orders", counter_store, 16);
        tokio::spawn(actor.run());

        let worker = FulfillmentWorker::new(store.clone(), Arc::new(ScriptedFulfillment::new()))
            .with_counter(handle.clone());

        worker.handle_batch(&[delivery(&order_id, 1)]).await;
        worker.handle_batch(&[delivery(&order_id, 2)]).await;

        let snapshot = handle.get().await.unwrap();
        assert_eq!(snapshot.completed_count, 1, "redelivery must not double-count");

        let order = store.get(&order_id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Completed);
    }

    #[tokio::test]
    async fn test_counter_failure_does_not_fail_order() {
        let store = Arc::new(MemoryOrderStore::new());
        let order_id = create_order(&store, "Alice");

        // Handle whose actor is gone: every counter call errors.
        let counter_store = Arc::new(MemoryCounterStore::new()) as Arc<dyn CounterStore>;
        let (handle, actor) = create_counter("orders", counter_store, 16);
        drop(actor);

        let worker = FulfillmentWorker::new(store.clone(), Arc::new(ScriptedFulfillment::new()))
            .with_counter(handle);

        let outcome = worker.handle_batch(&[delivery(&order_id, 1)]).await;
        assert!(outcome.is_clean());
        assert_eq!(
            store.get(&order_id).unwrap().unwrap().status,
            OrderStatus::Completed
        );
    }

    #[tokio::test]
    async fn test_store_failure_on_primary_transition_is_fatal_for_attempt() {
        let store = Arc::new(MemoryOrderStore::new());
        let order_id = create_order(&store, "Alice");
        store.fail_begin_preparing(true);

        let worker = FulfillmentWorker::new(
            store.clone(),
            Arc::new(ScriptedFulfillment::new()),
        );

        let outcome = worker.handle_batch(&[delivery(&order_id, 1)]).await;
        assert_eq!(outcome.retries(), &[0]);
    }

    #[tokio::test]
    async fn test_cancellation_write_failure_still_propagates_action_error() {
        let store = Arc::new(MemoryOrderStore::new());
        let order_id = create_order(&store, "Bob");
        store.fail_cancel(true);

        let action = ScriptedFulfillment::new();
        action.fail_always(&order_id);
        let worker = FulfillmentWorker::new(store.clone(), Arc::new(action));

        // The cancel write fails silently; the attempt is still retried.
        let outcome = worker.handle_batch(&[delivery(&order_id, 1)]).await;
        assert_eq!(outcome.retries(), &[0]);

        let order = store.get(&order_id).unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
    }
}
