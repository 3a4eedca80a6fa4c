//! Fulfillment error types.

use thiserror::Error;

/// Errors that can occur while fulfilling an order.
#[derive(Debug, Error)]
pub enum FulfillmentError {
    /// The fulfillment action itself failed. This is the sole cancellation
    /// trigger; the queue's retry policy decides what happens next.
    #[error("fulfillment action failed: {0}")]
    Action(String),

    /// Order store error on the authoritative path. Fatal for the attempt.
    #[error("order store error: {0}")]
    Store(#[from] crate::order::OrderError),
}
