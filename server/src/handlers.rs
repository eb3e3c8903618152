//! HTTP request handlers.

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response}
};
use gw_core::{MarketInput, Usage};
use observability::EndpointCount;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::middleware::CallerHints;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub analysis: String,
    pub from_cache: bool,
    pub attempts: u32,
    pub latency_ms: u64,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>
}

/// POST /api/analysis
pub async fn analysis(
    State(state): State<Arc<AppState>>,
    Extension(hints): Extension<CallerHints>,
    payload: Result<Json<Value>, JsonRejection>
) -> ApiResult<Json<AnalysisResponse>> {
    let Json(body) = payload?;
    let client = hints.resolve(&body);
    let input = MarketInput::from_json(&body);

    let response = state.pipeline.handle(&input, &client).await?;

    Ok(Json(AnalysisResponse {
        analysis: response.commentary.text,
        from_cache: response.cached,
        attempts: response.attempts,
        latency_ms: response.latency_ms,
        model: response.commentary.model,
        usage: response.commentary.usage
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub components: Value,
    pub uptime_seconds: u64,
    pub timestamp: String
}

/// GET /api/health
///
/// Returns 206 while commentary comes from the synthetic backend.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let pipeline = &state.pipeline;
    let degraded = state.is_degraded();

    let components = json!({
        "rate_limiter": {
            "status": "operational",
            "tracked_clients": pipeline.rate_limiter().tracked_clients()
        },
        "cache": {
            "status": if pipeline.cache().is_enabled() { "operational" } else { "disabled" },
            "size": pipeline.cache().len()
        },
        "upstream": {
            "status": if degraded { "degraded" } else { "operational" },
            "backend": pipeline.backend().name()
        }
    });

    let (status, code) = if degraded {
        ("degraded", StatusCode::PARTIAL_CONTENT)
    } else {
        ("healthy", StatusCode::OK)
    };

    (
        code,
        Json(HealthResponse {
            status,
            components,
            uptime_seconds: state.uptime().as_secs(),
            timestamp: chrono::Utc::now().to_rfc3339()
        })
    )
}

pub async fn live() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

/// GET /api/health/ready
///
/// The synthetic backend still serves traffic, so readiness only reports
/// which backend answers and whether it is degraded.
pub async fn ready(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ready",
        "backend": state.pipeline.backend().name(),
        "degraded": state.is_degraded()
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub requests_total: u64,
    pub requests_last_5min: u64,
    pub window_seconds: u64,
    pub error_rate_percent: f64,
    pub avg_latency_ms: f64,
    pub cache_hit_rate_percent: f64,
    pub cache_size: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub rate_limited_total: u64,
    pub tracked_clients: usize,
    pub top_endpoints: Vec<EndpointCount>
}

/// GET /api/stats
pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let snapshot = state.stats.snapshot();
    let cache = state.pipeline.cache().stats();

    Json(StatsResponse {
        requests_total: snapshot.requests_total,
        requests_last_5min: snapshot.requests_in_window,
        window_seconds: state.stats.window().as_secs(),
        error_rate_percent: snapshot.error_rate_percent,
        avg_latency_ms: snapshot.avg_latency_ms,
        cache_hit_rate_percent: (cache.hit_rate() * 10000.0).round() / 100.0,
        cache_size: cache.size,
        cache_hits: cache.hits,
        cache_misses: cache.misses,
        rate_limited_total: snapshot.rate_limited_total,
        tracked_clients: state.pipeline.rate_limiter().tracked_clients(),
        top_endpoints: snapshot.top_endpoints
    })
}

/// DELETE /api/cache
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> Json<Value> {
    let cleared = state.pipeline.cache().clear();
    tracing::info!(cleared, "Cache cleared");
    Json(json!({ "cleared": cleared }))
}

/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render()
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "metrics are disabled\n").into_response()
    }
}
