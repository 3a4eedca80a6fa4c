use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{counter, handlers, middleware::metrics_middleware, orders, ws};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Orders (gateway + lookups)
        .route("/orders", post(orders::submit_order))
        .route("/orders", get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        // Counter point calls
        .route("/counter/count", get(counter::get_count))
        .route("/counter/increment-queued", post(counter::increment_queued))
        .route(
            "/counter/increment-completed",
            post(counter::increment_completed),
        )
        .route("/counter/reset", post(counter::reset))
        // Counter push channel
        .route("/counter/ws", get(ws::counter_ws))
        .with_state(state.clone());

    let metrics_route = Router::new()
        .route("/metrics", get(handlers::metrics))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(metrics_route)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
