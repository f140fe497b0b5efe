//! Health endpoint integration tests
//!
//! Tests for the health check endpoints:
//! - GET /health - Full health check with dependency status
//! - GET /health/live - Liveness probe
//! - GET /metrics - Prometheus exposition

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::create_test_server;
use crate::mocks::MockBackendServer;

#[tokio::test]
async fn test_liveness_needs_no_backend() {
    let backend = MockBackendServer::start().await;
    let server = create_test_server(&backend.uri());

    let response = server.get("/health/live").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body, json!({ "status": "healthy" }));
    assert!(backend.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_health_with_reachable_catalog() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["policy"]["status"], "healthy");
    assert_eq!(body["checks"]["catalog"]["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_with_empty_catalog_is_degraded() {
    let backend = MockBackendServer::start().await;
    backend.mock_models(vec![]).await;
    let server = create_test_server(&backend.uri());

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["catalog"]["error"], "Model catalog is empty");
}

#[tokio::test]
async fn test_health_with_failing_catalog_is_unavailable() {
    let backend = MockBackendServer::start().await;
    backend.mock_models_error(500).await;
    let server = create_test_server(&backend.uri());

    let response = server.get("/health").await;

    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["checks"]["catalog"]["status"], "unhealthy");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    quorum::routes::metrics::init_metrics();
    let backend = MockBackendServer::start().await;
    let server = create_test_server(&backend.uri());

    let response = server.get("/metrics").await;

    response.assert_status_ok();
}
