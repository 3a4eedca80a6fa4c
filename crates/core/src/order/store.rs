//! Order storage trait and query types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::order::{Order, OrderItem, OrderStatus};

/// Error type for order store operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order not found.
    #[error("order not found: {0}")]
    NotFound(String),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Request to create a new order.
#[derive(Debug, Clone)]
pub struct CreateOrderRequest {
    /// Customer submitting the order.
    pub customer_name: String,
    /// What is being ordered.
    pub item: OrderItem,
    /// Price in cents, as quoted at submission.
    pub price_cents: i64,
    /// Estimate shown to the customer while the order is in flight.
    pub estimated_time: String,
}

/// Filter for querying orders.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Filter by status.
    pub status: Option<OrderStatus>,
    /// Filter by customer.
    pub customer_name: Option<String>,
    /// Maximum number of results.
    pub limit: i64,
    /// Offset for pagination.
    pub offset: i64,
}

impl OrderFilter {
    /// Create a new filter with defaults.
    pub fn new() -> Self {
        Self {
            status: None,
            customer_name: None,
            limit: 100,
            offset: 0,
        }
    }

    /// Filter by status.
    pub fn with_status(mut self, status: OrderStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Filter by customer.
    pub fn with_customer(mut self, customer_name: impl Into<String>) -> Self {
        self.customer_name = Some(customer_name.into());
        self
    }

    /// Set limit.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Set offset.
    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Trait for order storage backends.
///
/// Status transitions are absolute "set to X" writes so redelivered
/// fulfillment attempts converge on the same record. The guards below are the
/// only exceptions: a `completed` order is never written over, and
/// `complete` reports whether the caller performed the first completion so
/// side effects can be deduplicated.
pub trait OrderStore: Send + Sync {
    /// Create a new order in `pending` state.
    fn create(&self, request: CreateOrderRequest) -> Result<Order, OrderError>;

    /// Get an order by ID.
    fn get(&self, id: &str) -> Result<Option<Order>, OrderError>;

    /// List orders matching the filter, newest first.
    fn list(&self, filter: &OrderFilter) -> Result<Vec<Order>, OrderError>;

    /// Count orders matching the filter.
    fn count(&self, filter: &OrderFilter) -> Result<i64, OrderError>;

    /// Move an order to `preparing` for a fulfillment attempt.
    ///
    /// Sets `processed_at` only if it is still unset, so redeliveries keep
    /// the original value. A `completed` order is left untouched and returned
    /// as-is; callers must check the returned status.
    fn begin_preparing(&self, id: &str, now: DateTime<Utc>) -> Result<Order, OrderError>;

    /// Move an order to `completed`, stamping `completed_at`.
    ///
    /// Only applies while the order is `pending` or `preparing`. Returns true
    /// when this call performed the transition, false when the order had
    /// already left those states.
    fn complete(&self, id: &str, now: DateTime<Utc>) -> Result<bool, OrderError>;

    /// Move an order to `cancelled`. A `completed` order is left untouched.
    fn cancel(&self, id: &str, now: DateTime<Utc>) -> Result<Order, OrderError>;
}
