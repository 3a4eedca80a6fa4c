//! Scriptable fulfillment action for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::fulfillment::{FulfillmentAction, FulfillmentError};
use crate::queue::OrderMessage;

/// Mock implementation of the FulfillmentAction trait.
///
/// Provides controllable behavior for testing:
/// - Succeeds by default, with no latency
/// - Fail a given order id forever, or for its first N attempts
/// - Records every call for assertions
#[derive(Default)]
pub struct ScriptedFulfillment {
    /// order_id -> remaining failures (u32::MAX = always fail).
    failures: Mutex<HashMap<String, u32>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedFulfillment {
    /// Create a new scripted action that always succeeds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every attempt for `order_id`.
    pub fn fail_always(&self, order_id: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(order_id.to_string(), u32::MAX);
    }

    /// Fail the first `times` attempts for `order_id`, then succeed.
    pub fn fail_times(&self, order_id: &str, times: u32) {
        self.failures
            .lock()
            .unwrap()
            .insert(order_id.to_string(), times);
    }

    /// Order ids of all fulfill calls so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FulfillmentAction for ScriptedFulfillment {
    async fn fulfill(&self, message: &OrderMessage) -> Result<(), FulfillmentError> {
        self.calls.lock().unwrap().push(message.order_id.clone());

        let mut failures = self.failures.lock().unwrap();
        if let Some(remaining) = failures.get_mut(&message.order_id) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(FulfillmentError::Action(format!(
                    "scripted failure for {}",
                    message.order_id
                )));
            }
        }
        Ok(())
    }
}
