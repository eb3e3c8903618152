use adapters::SyntheticBackend;
use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header}
};
use config::Config;
use errors::UpstreamFailure;
use gateway_server::{AppState, create_router};
use gw_core::InferenceBackend;
use serde_json::{Value, json};
use std::sync::Arc;
use testing::{
    PendingBackend, ScriptedBackend, Step, deterministic_retry, scenario_a_body, unique_id
};
use tower::ServiceExt;

fn test_config() -> Config {
    let mut config = Config::default();
    config.upstream.timeout_ms = 200;
    config.upstream.retry = deterministic_retry(0);
    config
}

fn app_with(config: &Config, backend: Arc<dyn InferenceBackend>) -> Router {
    create_router(Arc::new(AppState::new(config, backend)))
}

fn app(backend: Arc<dyn InferenceBackend>) -> Router {
    app_with(&test_config(), backend)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, headers, json)
}

fn analysis(client: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/analysis")
        .header("content-type", "application/json")
        .header("x-client-id", client)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_analysis_then_cached() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let app = app(backend.clone());
    let client = unique_id("api");

    let (status, _, body) = send(&app, analysis(&client, &scenario_a_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_cache"], false);
    assert_eq!(body["attempts"], 1);
    assert!(!body["analysis"].as_str().unwrap().is_empty());

    let (status, _, body) = send(&app, analysis(&client, &scenario_a_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["from_cache"], true);
    assert_eq!(body["attempts"], 0);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_out_of_range_rate_is_rejected() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let app = app(backend.clone());

    let mut body = scenario_a_body();
    body["rate"] = json!(-10);
    let (status, _, body) = send(&app, analysis(&unique_id("api"), &body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "validation_error");
    assert_eq!(body["error"]["code"], "VALIDATION_FAILED");
    assert_eq!(body["error"]["violations"][0]["field"], "rate");
    assert_eq!(backend.calls(), 0);
}

#[tokio::test]
async fn test_every_missing_field_is_reported() {
    let app = app(Arc::new(ScriptedBackend::always_ok()));

    let (status, _, body) = send(&app, analysis(&unique_id("api"), &json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["violations"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let app = app(Arc::new(ScriptedBackend::always_ok()));

    let request = Request::builder()
        .method("POST")
        .uri("/api/analysis")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "MALFORMED_BODY");
}

#[tokio::test]
async fn test_eleventh_request_gets_retry_after() {
    let app = app(Arc::new(ScriptedBackend::always_ok()));
    let client = unique_id("api");

    for _ in 0..10 {
        let (status, _, _) = send(&app, analysis(&client, &scenario_a_body())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, headers, body) = send(&app, analysis(&client, &scenario_a_body())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"]["scope"], "minute");

    let retry_after: u64 = headers[header::RETRY_AFTER]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    assert!(retry_after >= 1 && retry_after <= 60);
    assert_eq!(body["error"]["retryAfter"], retry_after);
}

#[tokio::test]
async fn test_client_id_from_body_when_header_absent() {
    let mut config = test_config();
    config.rate_limit.short_limit = 1;
    let app = app_with(&config, Arc::new(ScriptedBackend::always_ok()));

    let request = |client: &str| {
        let mut body = scenario_a_body();
        body["clientId"] = json!(client);
        Request::builder()
            .method("POST")
            .uri("/api/analysis")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    };

    let alice = unique_id("alice");
    let bob = unique_id("bob");
    assert_eq!(send(&app, request(&alice)).await.0, StatusCode::OK);
    assert_eq!(send(&app, request(&bob)).await.0, StatusCode::OK);
    assert_eq!(
        send(&app, request(&alice)).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
}

#[tokio::test(start_paused = true)]
async fn test_upstream_timeout_maps_to_504() {
    let app = app(Arc::new(PendingBackend::new()));

    let (status, _, body) = send(&app, analysis(&unique_id("api"), &scenario_a_body())).await;

    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(body["error"]["kind"], "timeout_error");
    assert_eq!(body["error"]["attempts"], 1);
}

#[tokio::test]
async fn test_upstream_rejection_maps_to_502() {
    let app = app(Arc::new(ScriptedBackend::always(Step::Fail(
        UpstreamFailure::Rejected {
            status: 401,
            detail: "sk-secret is invalid".to_string()
        }
    ))));

    let (status, _, body) = send(&app, analysis(&unique_id("api"), &scenario_a_body())).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "UPSTREAM_REJECTED");
    assert!(!body.to_string().contains("sk-secret"));
}

#[tokio::test]
async fn test_health_reports_degraded_synthetic_backend() {
    let app = app(Arc::new(SyntheticBackend::new()));

    let (status, _, body) = send(&app, get("/api/health")).await;

    assert_eq!(status, StatusCode::PARTIAL_CONTENT);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["components"]["upstream"]["backend"], "synthetic");
}

#[tokio::test]
async fn test_health_is_ok_with_real_backend() {
    let app = app(Arc::new(ScriptedBackend::always_ok()));

    let (status, _, body) = send(&app, get("/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_probes() {
    let app = app(Arc::new(ScriptedBackend::always_ok()));

    let (status, _, body) = send(&app, get("/api/health/live")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "alive");

    let (status, _, body) = send(&app, get("/api/health/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["degraded"], false);
}

#[tokio::test]
async fn test_ready_names_synthetic_backend() {
    let app = app(Arc::new(SyntheticBackend::new()));

    let (status, _, body) = send(&app, get("/api/health/ready")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "synthetic");
    assert_eq!(body["degraded"], true);
}

#[tokio::test]
async fn test_stats_reflect_traffic() {
    let app = app(Arc::new(ScriptedBackend::always_ok()));
    let client = unique_id("api");

    send(&app, analysis(&client, &scenario_a_body())).await;
    send(&app, analysis(&client, &scenario_a_body())).await;
    send(&app, analysis(&client, &json!({}))).await;

    let (status, _, body) = send(&app, get("/api/stats")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["requests_total"], 3);
    assert_eq!(body["cache_hits"], 1);
    assert_eq!(body["cache_misses"], 1);
    assert_eq!(body["cache_size"], 1);
    assert_eq!(body["cache_hit_rate_percent"], 50.0);
    assert_eq!(body["tracked_clients"], 1);
    assert_eq!(body["top_endpoints"][0]["endpoint"], "/api/analysis");
    assert_eq!(body["top_endpoints"][0]["count"], 3);
}

#[tokio::test]
async fn test_clear_cache_forces_fresh_call() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let app = app(backend.clone());
    let client = unique_id("api");

    send(&app, analysis(&client, &scenario_a_body())).await;

    let request = Request::builder()
        .method("DELETE")
        .uri("/api/cache")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], 1);

    let (_, _, body) = send(&app, analysis(&client, &scenario_a_body())).await;
    assert_eq!(body["from_cache"], false);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test]
async fn test_metrics_disabled_without_recorder() {
    let app = app(Arc::new(ScriptedBackend::always_ok()));

    let (status, _, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
