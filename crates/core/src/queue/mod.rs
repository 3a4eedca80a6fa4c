//! In-process order queue with batched, at-least-once delivery.

mod broker;
mod config;
mod dead_letter;
mod types;

pub use broker::{create_queue, QueueProducer, QueueRunner};
pub use config::QueueConfig;
pub use dead_letter::DeadLetterHandler;
pub use types::{BatchHandler, BatchOutcome, Delivery, OrderMessage, QueueError};
