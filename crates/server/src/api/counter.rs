//! Counter API handlers: the point-call boundary of the counter actor.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

use orderline_core::{CounterHandle, CounterSnapshot};

use crate::state::AppState;

/// Envelope for mutating counter calls.
#[derive(Debug, Serialize)]
pub struct CounterMutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub snapshot: CounterSnapshot,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct CounterErrorResponse {
    pub success: bool,
    pub message: String,
}

fn counter_unavailable() -> (StatusCode, Json<CounterErrorResponse>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(CounterErrorResponse {
            success: false,
            message: "counter is not available".to_string(),
        }),
    )
}

fn counter_error(e: impl std::fmt::Display) -> (StatusCode, Json<CounterErrorResponse>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(CounterErrorResponse {
            success: false,
            message: e.to_string(),
        }),
    )
}

fn resolve_counter(state: &AppState) -> Result<CounterHandle, (StatusCode, Json<CounterErrorResponse>)> {
    state.counter().ok_or_else(counter_unavailable)
}

// ============================================================================
// Handlers
// ============================================================================

/// Read the current counts without mutating.
pub async fn get_count(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CounterSnapshot>, impl IntoResponse> {
    let counter = resolve_counter(&state)?;
    match counter.get().await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => Err(counter_error(e)),
    }
}

/// Increment the queued-order count.
pub async fn increment_queued(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CounterMutationResponse>, impl IntoResponse> {
    let counter = resolve_counter(&state)?;
    match counter.increment_queued().await {
        Ok(snapshot) => Ok(Json(CounterMutationResponse {
            success: true,
            message: "queued count incremented".to_string(),
            snapshot,
        })),
        Err(e) => Err(counter_error(e)),
    }
}

/// Increment the completed-order count.
pub async fn increment_completed(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CounterMutationResponse>, impl IntoResponse> {
    let counter = resolve_counter(&state)?;
    match counter.increment_completed().await {
        Ok(snapshot) => Ok(Json(CounterMutationResponse {
            success: true,
            message: "completed count incremented".to_string(),
            snapshot,
        })),
        Err(e) => Err(counter_error(e)),
    }
}

/// Reset both counts to zero.
pub async fn reset(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CounterMutationResponse>, impl IntoResponse> {
    let counter = resolve_counter(&state)?;
    match counter.reset().await {
        Ok(snapshot) => Ok(Json(CounterMutationResponse {
            success: true,
            message: "counter reset".to_string(),
            snapshot,
        })),
        Err(e) => Err(counter_error(e)),
    }
}
