use config::Config;
use errors::{GatewayError, RateLimitScope, UpstreamFailure, ViolationCode};
use governance::RequestPipeline;
use gw_core::{ClientId, InferenceBackend, MarketInput};
use std::sync::Arc;
use std::time::Duration;
use testing::{
    PendingBackend, ScriptedBackend, Step, deterministic_retry, scenario_a_input,
    scenario_b_input, unique_client_id
};
use tokio::time::Instant;

fn test_config(max_retries: u32) -> Config {
    let mut config = Config::default();
    config.upstream.timeout_ms = 1000;
    config.upstream.retry = deterministic_retry(max_retries);
    config.cache.ttl_seconds = 60;
    config
}

fn pipeline(config: &Config, backend: Arc<dyn InferenceBackend>) -> RequestPipeline {
    RequestPipeline::from_config(config, backend)
}

#[tokio::test(start_paused = true)]
async fn test_identical_request_is_served_from_cache() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = pipeline(&test_config(3), backend.clone());
    let client = unique_client_id();

    let first = pipeline.handle(&scenario_a_input(), &client).await.unwrap();
    assert!(!first.cached);
    assert_eq!(first.attempts, 1);

    let second = pipeline.handle(&scenario_a_input(), &client).await.unwrap();
    assert!(second.cached);
    assert_eq!(second.attempts, 0);
    assert_eq!(second.commentary, first.commentary);

    assert_eq!(backend.calls(), 1);
    assert_eq!(pipeline.cache().stats().hits, 1);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_rate_consumes_nothing() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = pipeline(&test_config(3), backend.clone());
    let client = unique_client_id();

    let err = pipeline
        .handle(&scenario_b_input(), &client)
        .await
        .unwrap_err();

    match err {
        GatewayError::Validation { violations } => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].field, "rate");
            assert_eq!(violations[0].code, ViolationCode::OutOfRange);
        }
        other => panic!("expected validation error, got {:?}", other)
    }

    assert_eq!(backend.calls(), 0);
    assert_eq!(pipeline.rate_limiter().remaining(&client), 10);
    assert_eq!(pipeline.rate_limiter().tracked_clients(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_eleventh_rapid_call_is_rate_limited() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = pipeline(&test_config(3), backend.clone());
    let client = unique_client_id();

    for _ in 0..10 {
        assert!(pipeline.handle(&scenario_a_input(), &client).await.is_ok());
    }

    let err = pipeline
        .handle(&scenario_a_input(), &client)
        .await
        .unwrap_err();
    match err {
        GatewayError::RateLimited { retry_after, scope } => {
            assert_eq!(scope, RateLimitScope::Minute);
            assert!(retry_after > 0);
        }
        other => panic!("expected rate limit, got {:?}", other)
    }
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cache_hits_still_count_against_quota() {
    let mut config = test_config(3);
    config.rate_limit.short_limit = 2;
    let pipeline = pipeline(&config, Arc::new(ScriptedBackend::always_ok()));
    let client = unique_client_id();

    assert!(!pipeline.handle(&scenario_a_input(), &client).await.unwrap().cached);
    assert!(pipeline.handle(&scenario_a_input(), &client).await.unwrap().cached);
    assert_eq!(
        pipeline
            .handle(&scenario_a_input(), &client)
            .await
            .unwrap_err()
            .kind(),
        "rate_limit_error"
    );
}

#[tokio::test(start_paused = true)]
async fn test_nearby_inputs_share_cached_result() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = pipeline(&test_config(3), backend.clone());
    let client = unique_client_id();

    let nearby = MarketInput::new(3.55, 1253.0, 85200.0, 119900.0, 95.2);

    pipeline.handle(&scenario_a_input(), &client).await.unwrap();
    let response = pipeline.handle(&nearby, &client).await.unwrap();

    assert!(response.cached);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_triggers_one_fresh_call() {
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = pipeline(&test_config(3), backend.clone());
    let client = unique_client_id();

    pipeline.handle(&scenario_a_input(), &client).await.unwrap();
    tokio::time::advance(Duration::from_secs(61)).await;

    let response = pipeline.handle(&scenario_a_input(), &client).await.unwrap();
    assert!(!response.cached);
    assert_eq!(backend.calls(), 2);

    let response = pipeline.handle(&scenario_a_input(), &client).await.unwrap();
    assert!(response.cached);
    assert_eq!(backend.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_retryable_failures_then_success() {
    let backend = Arc::new(ScriptedBackend::failing_then_ok(
        2,
        UpstreamFailure::Throttled { retry_after: None }
    ));
    let pipeline = pipeline(&test_config(3), backend.clone());

    let started = Instant::now();
    let response = pipeline
        .handle(&scenario_a_input(), &unique_client_id())
        .await
        .unwrap();

    assert_eq!(response.attempts, 3);
    assert!(!response.cached);
    assert!(started.elapsed() >= Duration::from_secs(3));
    assert_eq!(backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_always_timing_out_upstream() {
    let backend = Arc::new(PendingBackend::new());
    let pipeline = pipeline(&test_config(2), backend.clone());

    let err = pipeline
        .handle(&scenario_a_input(), &unique_client_id())
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Timeout { attempts: 3, .. }));
    assert_eq!(backend.calls(), 3);
    assert!(pipeline.cache().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_terminal_failure_is_attempted_once() {
    let backend = Arc::new(ScriptedBackend::always(Step::Fail(UpstreamFailure::Rejected {
        status: 422,
        detail: "unprocessable".to_string()
    })));
    let pipeline = pipeline(&test_config(3), backend.clone());

    let err = pipeline
        .handle(&scenario_a_input(), &unique_client_id())
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "UPSTREAM_REJECTED");
    assert_eq!(backend.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_failures_are_not_cached() {
    let backend = Arc::new(ScriptedBackend::new([
        Step::Fail(UpstreamFailure::Server { status: 500 }),
        Step::Fail(UpstreamFailure::Server { status: 500 })
    ]));
    let pipeline = pipeline(&test_config(1), backend.clone());
    let client = unique_client_id();

    assert!(pipeline.handle(&scenario_a_input(), &client).await.is_err());
    let response = pipeline.handle(&scenario_a_input(), &client).await.unwrap();

    assert!(!response.cached);
    assert_eq!(backend.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_cache_key_fault_degrades_to_miss() {
    let mut config = test_config(3);
    config.cache.asset_step = 1e-300;
    let backend = Arc::new(ScriptedBackend::always_ok());
    let pipeline = pipeline(&config, backend.clone());
    let client = unique_client_id();

    for _ in 0..2 {
        let response = pipeline.handle(&scenario_a_input(), &client).await.unwrap();
        assert!(!response.cached);
    }

    assert_eq!(backend.calls(), 2);
    assert!(pipeline.cache().is_empty());

    let stats = pipeline.cache().stats();
    assert_eq!(stats.hits, 0);
    assert_eq!(stats.misses, 2);
}

#[tokio::test(start_paused = true)]
async fn test_clients_have_independent_quotas() {
    let mut config = test_config(3);
    config.rate_limit.short_limit = 1;
    let pipeline = pipeline(&config, Arc::new(ScriptedBackend::always_ok()));

    let alice = ClientId::new("alice");
    let bob = ClientId::new("bob");

    assert!(pipeline.handle(&scenario_a_input(), &alice).await.is_ok());
    assert!(pipeline.handle(&scenario_a_input(), &bob).await.is_ok());
    assert!(pipeline.handle(&scenario_a_input(), &alice).await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_slow_but_timely_upstream_succeeds() {
    let backend = Arc::new(ScriptedBackend::new([Step::Delayed(
        Duration::from_millis(900),
        testing::sample_commentary()
    )]));
    let pipeline = pipeline(&test_config(0), backend.clone());

    let response = pipeline
        .handle(&scenario_a_input(), &unique_client_id())
        .await
        .unwrap();

    assert_eq!(response.attempts, 1);
    assert!(response.latency_ms >= 900);
}
