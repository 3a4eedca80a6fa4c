//! The fulfillment action seam.
//!
//! Everything the business actually does to fulfill an order (charging,
//! inventory, barista robots) hides behind [`FulfillmentAction`]. The worker
//! only cares that the action either succeeds or raises.

use std::time::Duration;

use async_trait::async_trait;

use crate::queue::OrderMessage;

use super::{FulfillmentConfig, FulfillmentError};

/// Executes the business side of fulfilling one order.
#[async_trait]
pub trait FulfillmentAction: Send + Sync {
    async fn fulfill(&self, message: &OrderMessage) -> Result<(), FulfillmentError>;
}

/// Bounded-latency stand-in for the real fulfillment step.
pub struct SimulatedFulfillment {
    delay: Duration,
}

impl SimulatedFulfillment {
    /// Create a simulated action from config.
    pub fn new(config: &FulfillmentConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.fulfill_delay_ms),
        }
    }
}

#[async_trait]
impl FulfillmentAction for SimulatedFulfillment {
    async fn fulfill(&self, message: &OrderMessage) -> Result<(), FulfillmentError> {
        tracing::debug!(
            "Preparing {} {} for {}",
            message.item_descriptor.size,
            message.item_descriptor.category,
            message.customer_name
        );
        tokio::time::sleep(self.delay).await;
        Ok(())
    }
}
