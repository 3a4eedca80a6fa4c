//! Core order data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Persisted, waiting for a fulfillment attempt.
    Pending,
    /// A fulfillment attempt is in flight.
    Preparing,
    /// Prepared and waiting for pickup.
    Ready,
    /// Fulfilled successfully. Terminal.
    Completed,
    /// Fulfillment gave up on this order. Terminal.
    Cancelled,
}

impl OrderStatus {
    /// Returns the status as its wire/database string.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a status from its string form.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Returns true for states no further processing should change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }
}

/// Descriptor of the item being ordered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Item category (e.g. "latte", "espresso").
    pub category: String,
    /// Size label (e.g. "small", "medium", "large").
    pub size: String,
    /// Add-ons requested with the item.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extras: Vec<String>,
}

impl OrderItem {
    /// Create an item descriptor without extras.
    pub fn new(category: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            size: size.into(),
            extras: Vec::new(),
        }
    }

    /// Add extras.
    pub fn with_extras(mut self, extras: Vec<String>) -> Self {
        self.extras = extras;
        self
    }
}

/// An order record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub item: OrderItem,
    pub status: OrderStatus,
    /// Price in cents, fixed at submission time.
    pub price_cents: i64,
    /// Display string shown while the order is still in flight.
    pub estimated_time: String,
    pub created_at: DateTime<Utc>,
    pub queued_at: DateTime<Utc>,
    /// Set exactly once, when the first fulfillment attempt starts.
    pub processed_at: Option<DateTime<Utc>>,
    /// Set when the order reaches `completed`.
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}
