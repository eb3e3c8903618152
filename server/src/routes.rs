//! Route definitions.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post}
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer
};

use crate::handlers;
use crate::middleware::{caller_hints, track_requests};
use crate::state::AppState;

/// Creates the router with every route and layer configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/analysis", post(handlers::analysis))
        .route("/health", get(handlers::health))
        .route("/health/live", get(handlers::live))
        .route("/health/ready", get(handlers::ready))
        .route("/stats", get(handlers::stats))
        .route("/cache", delete(handlers::clear_cache));

    Router::new()
        .nest("/api", api)
        .route("/metrics", get(handlers::metrics))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            track_requests
        ))
        .layer(axum_middleware::from_fn(caller_hints))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
