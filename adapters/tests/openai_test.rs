use adapters::OpenAiBackend;
use errors::UpstreamFailure;
use gw_core::{CommentaryRequest, InferenceBackend, MarketParams};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> CommentaryRequest {
    CommentaryRequest::new(MarketParams {
        rate: 3.5,
        fx: 1250.0,
        asset_a: 85000.0,
        asset_b: 120000.0,
        bond_index: 95.0
    })
}

fn backend(server: &MockServer) -> OpenAiBackend {
    OpenAiBackend::new("sk-test", &format!("{}/v1", server.uri()), "gpt-4o-mini")
}

#[tokio::test]
async fn test_successful_completion_is_parsed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "max_tokens": 500
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini-2024",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Rates are neutral." }
            }],
            "usage": {
                "prompt_tokens": 120,
                "completion_tokens": 8,
                "total_tokens": 128
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let commentary = backend(&server).generate(&request()).await.unwrap();

    assert_eq!(commentary.text, "Rates are neutral.");
    assert_eq!(commentary.model, "gpt-4o-mini-2024");
    let usage = commentary.usage.unwrap();
    assert_eq!(usage.total_tokens, 128);
}

#[tokio::test]
async fn test_request_carries_both_prompts() {
    let server = MockServer::start().await;
    let request = request();

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "ok" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(backend(&server).generate(&request).await.is_ok());
}

#[tokio::test]
async fn test_throttling_reads_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
        .mount(&server)
        .await;

    let failure = backend(&server).generate(&request()).await.unwrap_err();

    assert_eq!(failure, UpstreamFailure::Throttled { retry_after: Some(7) });
    assert!(failure.is_retryable());
}

#[tokio::test]
async fn test_throttling_without_header() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let failure = backend(&server).generate(&request()).await.unwrap_err();
    assert_eq!(failure, UpstreamFailure::Throttled { retry_after: None });
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let failure = backend(&server).generate(&request()).await.unwrap_err();

    assert_eq!(failure, UpstreamFailure::Server { status: 503 });
    assert!(failure.is_retryable());
}

#[tokio::test]
async fn test_client_error_is_terminal() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401).set_body_string("{\"error\":\"invalid api key\"}")
        )
        .mount(&server)
        .await;

    let failure = backend(&server).generate(&request()).await.unwrap_err();

    match &failure {
        UpstreamFailure::Rejected { status, detail } => {
            assert_eq!(*status, 401);
            assert!(detail.contains("invalid api key"));
        }
        other => panic!("expected rejection, got {:?}", other)
    }
    assert!(!failure.is_retryable());
}

#[tokio::test]
async fn test_missing_choices_is_empty_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let failure = backend(&server).generate(&request()).await.unwrap_err();
    assert_eq!(failure, UpstreamFailure::EmptyPayload);
}

#[tokio::test]
async fn test_malformed_body_is_empty_payload() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let failure = backend(&server).generate(&request()).await.unwrap_err();
    assert_eq!(failure, UpstreamFailure::EmptyPayload);
}

#[tokio::test]
async fn test_unreachable_host_is_transport_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = OpenAiBackend::new("sk-test", &format!("http://{addr}/v1"), "gpt-4o-mini");
    let failure = backend.generate(&request()).await.unwrap_err();

    assert!(matches!(failure, UpstreamFailure::Transport { .. }));
    assert!(failure.is_retryable());
}
