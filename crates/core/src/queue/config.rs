//! Queue configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the order queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Maximum number of messages delivered in one batch.
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// How long to wait for a batch to fill before delivering it anyway
    /// (milliseconds).
    #[serde(default = "default_max_batch_wait")]
    pub max_batch_wait_ms: u64,

    /// Redeliveries allowed per message before it is dead-lettered.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Name of the dead-letter destination, used in logs and metrics.
    #[serde(default = "default_dead_letter_name")]
    pub dead_letter_name: String,
}

fn default_max_batch_size() -> usize {
    10
}

fn default_max_batch_wait() -> u64 {
    500
}

fn default_max_retries() -> u32 {
    3
}

fn default_dead_letter_name() -> String {
    "orders-dlq".to_string()
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            max_batch_wait_ms: default_max_batch_wait(),
            max_retries: default_max_retries(),
            dead_letter_name: default_dead_letter_name(),
        }
    }
}
