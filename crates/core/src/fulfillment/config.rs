//! Fulfillment worker configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the fulfillment worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FulfillmentConfig {
    /// Simulated preparation latency (milliseconds). Only used by the
    /// built-in simulated action; real deployments replace the action.
    #[serde(default = "default_fulfill_delay")]
    pub fulfill_delay_ms: u64,
}

fn default_fulfill_delay() -> u64 {
    200
}

impl Default for FulfillmentConfig {
    fn default() -> Self {
        Self {
            fulfill_delay_ms: default_fulfill_delay(),
        }
    }
}
