//! Access decision endpoint tests
//!
//! POST /v1/access is pure governance: no backend traffic is expected.

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::create_test_server;
use crate::mocks::MockBackendServer;

#[tokio::test]
async fn test_free_user_denied_flagship_model() {
    let backend = MockBackendServer::start().await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/access")
        .json(&json!({
            "modelId": "anthropic/claude-opus-4.5",
            "userTier": "free",
            "usagePercent": 0
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["decision"]["allowed"], false);
    assert_eq!(body["decision"]["denial"], "subscription");
    assert_eq!(body["decision"]["costTier"], "flagship");
    assert_eq!(body["profile"]["requiredTier"], "enterprise");
    // Haiku is the configured substitute but is not on the free plan
    assert!(body["decision"].get("alternative").is_none());
    assert!(body.get("usage").is_none());

    assert!(backend.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_usage_throttle_suggests_alternative() {
    let backend = MockBackendServer::start().await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/access")
        .json(&json!({
            "modelId": "openai/gpt-5.2",
            "userTier": "pro",
            "usagePercent": 80
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["decision"]["allowed"], false);
    assert_eq!(body["decision"]["denial"], "usage");
    assert_eq!(body["decision"]["alternative"], "openai/gpt-5-mini");
    assert_eq!(body["decision"]["action"], "throttle");
    assert_eq!(body["allowedCostTiers"], json!(["budget", "standard"]));
    assert_eq!(body["shouldBlock"], false);
    assert_eq!(body["usage"]["action"], "throttle");
}

#[tokio::test]
async fn test_premium_boundary_at_fifty_percent() {
    let backend = MockBackendServer::start().await;
    let server = create_test_server(&backend.uri());

    let at_boundary: Value = server
        .post("/v1/access")
        .json(&json!({
            "modelId": "anthropic/claude-opus-4.5",
            "userTier": "enterprise",
            "usagePercent": 50
        }))
        .await
        .json();
    assert_eq!(at_boundary["decision"]["allowed"], true);
    assert_eq!(
        at_boundary["allowedCostTiers"],
        json!(["budget", "standard", "premium", "flagship"])
    );

    let past_boundary: Value = server
        .post("/v1/access")
        .json(&json!({
            "modelId": "anthropic/claude-opus-4.5",
            "userTier": "enterprise",
            "usagePercent": 50.01
        }))
        .await
        .json();
    assert_eq!(past_boundary["decision"]["allowed"], false);
    assert_eq!(past_boundary["decision"]["denial"], "usage");
    assert_eq!(
        past_boundary["allowedCostTiers"],
        json!(["budget", "standard", "premium"])
    );
}

#[tokio::test]
async fn test_exhausted_quota_reports_block() {
    let backend = MockBackendServer::start().await;
    let server = create_test_server(&backend.uri());

    let body: Value = server
        .post("/v1/access")
        .json(&json!({
            "modelId": "openai/gpt-4o-mini",
            "userTier": "starter",
            "usagePercent": 100
        }))
        .await
        .json();

    assert_eq!(body["shouldBlock"], true);
    assert_eq!(body["usage"]["action"], "block");
    assert_eq!(body["allowedCostTiers"], json!(["budget"]));
}

#[tokio::test]
async fn test_negative_usage_rejected() {
    let backend = MockBackendServer::start().await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/access")
        .json(&json!({
            "modelId": "openai/gpt-4o-mini",
            "userTier": "free",
            "usagePercent": -1
        }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}
