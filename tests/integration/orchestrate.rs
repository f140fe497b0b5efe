//! Full pipeline tests: governance, retry, timeouts and streaming

use std::time::Duration;

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{create_test_server, create_test_server_with, fast_retry, test_config};
use crate::mocks::MockBackendServer;

fn orchestration(model_id: &str, tier: &str, usage: f64) -> Value {
    json!({
        "prompt": "Summarise the release notes",
        "selections": [{ "modelId": model_id }],
        "userTier": tier,
        "usagePercent": usage
    })
}

#[tokio::test]
async fn test_orchestrate_success() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_success("All good").await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("openai/gpt-5-mini", "pro", 10.0))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["response"]["content"], "All good");
    assert_eq!(body["retry"]["attempts"], 0);
    assert_eq!(body["retry"]["exhausted"], false);
    assert_eq!(body["team"]["strategy"], "sequential");
    assert_eq!(body["notices"], json!([]));

    let sent = backend.inference_bodies().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["modelIds"], json!(["openai/gpt-5-mini"]));
    assert_eq!(sent[0]["strategy"], "sequential");
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_error_times(503, 2).await;
    backend.mock_inference_success("Recovered").await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("openai/gpt-5-mini", "pro", 0.0))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["response"]["content"], "Recovered");
    assert_eq!(body["retry"]["attempts"], 2);
    assert_eq!(backend.inference_bodies().await.len(), 3);
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_error(404).await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("openai/gpt-5-mini", "pro", 0.0))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    assert_eq!(body["error"]["details"]["attempts"], 0);
    assert_eq!(body["error"]["details"]["exhausted"], false);
    assert_eq!(backend.inference_bodies().await.len(), 1);
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_error(503).await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("openai/gpt-5-mini", "pro", 0.0))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["details"]["attempts"], 3);
    assert_eq!(body["error"]["details"]["exhausted"], true);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("4 attempts"), "message was {}", message);
    assert_eq!(backend.inference_bodies().await.len(), 4);
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend
        .mock_inference_delayed("Too late", Duration::from_secs(2))
        .await;
    let mut config = test_config(&backend.uri());
    config.standard_retry = fast_retry(1, 200);
    let server = create_test_server_with(config);

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("openai/gpt-5-mini", "pro", 0.0))
        .await;

    response.assert_status(StatusCode::GATEWAY_TIMEOUT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_TIMEOUT");
    assert_eq!(body["error"]["details"]["attempts"], 1);
    assert_eq!(body["error"]["details"]["exhausted"], true);
}

#[tokio::test]
async fn test_exhausted_quota_blocks_before_invocation() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_success("unreachable").await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("openai/gpt-4o-mini", "pro", 100.0))
        .await;

    response.assert_status(StatusCode::TOO_MANY_REQUESTS);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "USAGE_BLOCKED");
    assert_eq!(body["error"]["details"]["usagePercent"], 100.0);
    assert!(backend.inference_bodies().await.is_empty());
}

#[tokio::test]
async fn test_throttled_model_is_substituted() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_success("Substituted").await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("openai/gpt-5.2", "pro", 80.0))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["notices"][0]["modelId"], "openai/gpt-5.2");
    assert_eq!(body["notices"][0]["kind"], "substituted");
    assert_eq!(body["notices"][0]["alternative"], "openai/gpt-5-mini");
    assert_eq!(body["usage"]["action"], "throttle");

    let sent = backend.inference_bodies().await;
    assert_eq!(sent[0]["modelIds"], json!(["openai/gpt-5-mini"]));
}

#[tokio::test]
async fn test_subscription_denial_without_alternative() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_success("unreachable").await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&orchestration("anthropic/claude-opus-4.5", "free", 0.0))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "ACCESS_DENIED");
    assert!(backend.inference_bodies().await.is_empty());
}

#[tokio::test]
async fn test_streamed_orchestration() {
    let backend = MockBackendServer::with_default_catalog().await;
    backend.mock_inference_stream(&["Hel", "lo"]).await;
    let server = create_test_server(&backend.uri());

    let mut request = orchestration("openai/gpt-5-mini", "pro", 0.0);
    request["stream"] = json!(true);

    let response = server.post("/v1/orchestrate").json(&request).await;

    response.assert_status_ok();
    let body = response.text();
    assert!(body.contains("event: team"), "body was {}", body);
    assert!(body.contains("event: delta"));
    assert!(body.contains("data: Hel"));
    assert!(body.contains("data: lo"));
    assert!(body.contains("event: done"));

    let sent = backend.inference_bodies().await;
    assert_eq!(sent[0]["stream"], true);
}

#[tokio::test]
async fn test_empty_prompt_rejected() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/orchestrate")
        .json(&json!({
            "prompt": "  ",
            "selections": [{ "modelId": "openai/gpt-5-mini" }]
        }))
        .await;

    response.assert_status_bad_request();
    assert!(backend.received_requests().await.is_empty());
}
