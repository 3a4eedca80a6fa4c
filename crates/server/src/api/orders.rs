//! Order API handlers: the submission gateway and status lookups.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

use orderline_core::{
    CreateOrderRequest, Order, OrderFilter, OrderItem, OrderMessage, OrderStatus,
};

use crate::metrics::ORDERS_SUBMITTED_TOTAL;
use crate::state::AppState;

/// Maximum allowed limit for order queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for order queries
const DEFAULT_LIMIT: i64 = 100;

/// Estimate shown to customers while an order is in flight. Real estimation
/// lives with the business, not here.
const ESTIMATED_TIME: &str = "5-10 minutes";

/// Flat price table in cents, by size plus a per-extra surcharge.
fn quote_price_cents(item: &OrderItem) -> i64 {
    let base = match item.size.as_str() {
        "small" => 350,
        "large" => 550,
        _ => 450,
    };
    base + 50 * item.extras.len() as i64
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting an order
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderBody {
    pub customer_name: String,
    pub item: OrderItemBody,
}

/// Item descriptor in request body
#[derive(Debug, Deserialize)]
pub struct OrderItemBody {
    pub category: String,
    pub size: String,
    #[serde(default)]
    pub extras: Vec<String>,
}

/// Query parameters for listing orders
#[derive(Debug, Deserialize)]
pub struct ListOrdersParams {
    /// Filter by status
    pub status: Option<String>,
    /// Filter by customer
    pub customer: Option<String>,
    /// Maximum number of orders to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Response for order operations
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: String,
    pub customer_name: String,
    pub item: OrderItem,
    pub status: OrderStatus,
    pub price_cents: i64,
    /// Present only while the order is still in flight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub queued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        let estimated_time = if order.status.is_terminal() {
            None
        } else {
            Some(order.estimated_time)
        };
        Self {
            id: order.id,
            customer_name: order.customer_name,
            item: order.item,
            status: order.status,
            price_cents: order.price_cents,
            estimated_time,
            created_at: order.created_at,
            queued_at: order.queued_at,
            processed_at: order.processed_at,
            completed_at: order.completed_at,
            updated_at: order.updated_at,
        }
    }
}

/// Response for listing orders
#[derive(Debug, Serialize)]
pub struct ListOrdersResponse {
    pub orders: Vec<OrderResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct OrderErrorResponse {
    pub error: String,
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<OrderErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(OrderErrorResponse {
            error: message.into(),
        }),
    )
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<OrderErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(OrderErrorResponse {
            error: e.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new order: persist it as pending, enqueue a fulfillment message,
/// and nudge the counter.
pub async fn submit_order(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitOrderBody>,
) -> Result<(StatusCode, Json<OrderResponse>), impl IntoResponse> {
    if body.customer_name.trim().is_empty() {
        return Err(bad_request("customerName must not be empty"));
    }
    if body.item.category.trim().is_empty() || body.item.size.trim().is_empty() {
        return Err(bad_request("item category and size must not be empty"));
    }

    let item = OrderItem::new(body.item.category, body.item.size).with_extras(body.item.extras);

    let request = CreateOrderRequest {
        customer_name: body.customer_name,
        price_cents: quote_price_cents(&item),
        estimated_time: ESTIMATED_TIME.to_string(),
        item,
    };

    let order = state.order_store().create(request).map_err(internal_error)?;
    ORDERS_SUBMITTED_TOTAL.inc();

    let message = OrderMessage {
        order_id: order.id.clone(),
        customer_name: order.customer_name.clone(),
        item_descriptor: order.item.clone(),
        timestamp: order.queued_at,
    };

    if let Err(e) = state.producer().send(message).await {
        // The record exists but will never be picked up; surface the fault.
        return Err(internal_error(format!(
            "order {} accepted but could not be enqueued: {}",
            order.id, e
        )));
    }

    // Best-effort: counter trouble never fails a submission.
    if let Some(counter) = state.counter() {
        if let Err(e) = counter.increment_queued().await {
            warn!("Counter update failed for order {}: {}", order.id, e);
        }
    }

    Ok((StatusCode::CREATED, Json(OrderResponse::from(order))))
}

/// Get an order by ID
pub async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderResponse>, impl IntoResponse> {
    match state.order_store().get(&id) {
        Ok(Some(order)) => Ok(Json(OrderResponse::from(order))),
        Ok(None) => Err((
            StatusCode::NOT_FOUND,
            Json(OrderErrorResponse {
                error: format!("Order not found: {}", id),
            }),
        )),
        Err(e) => Err(internal_error(e)),
    }
}

/// List orders with optional filters
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListOrdersParams>,
) -> Result<Json<ListOrdersResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = OrderFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref status_param) = params.status {
        let Some(status) = OrderStatus::parse(status_param) else {
            return Err(bad_request(format!("Unknown status: {}", status_param)));
        };
        filter = filter.with_status(status);
    }

    if let Some(ref customer) = params.customer {
        filter = filter.with_customer(customer);
    }

    let orders = state.order_store().list(&filter).map_err(internal_error)?;

    // Total count without pagination.
    let count_filter = OrderFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter.clone()
    };
    let total = state
        .order_store()
        .count(&count_filter)
        .map_err(internal_error)?;

    Ok(Json(ListOrdersResponse {
        orders: orders.into_iter().map(OrderResponse::from).collect(),
        total,
        limit,
        offset,
    }))
}
