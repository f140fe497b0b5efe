//! Team build and recommendation endpoint tests

use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::create_test_server;
use crate::mocks::MockBackendServer;

fn cascade_selection() -> Value {
    json!({
        "selections": [
            { "modelId": "anthropic/claude-haiku-4.5", "role": "validator" },
            { "modelId": "openai/gpt-5.2", "role": "primary" }
        ],
        "name": "Review team",
        "completionTokens": 1000
    })
}

#[tokio::test]
async fn test_build_team_orders_roles_and_estimates_cost() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let response = server.post("/v1/teams").json(&cascade_selection()).await;

    response.assert_status_ok();
    let body: Value = response.json();
    let team = &body["team"];
    assert_eq!(team["name"], "Review team");
    assert_eq!(team["strategy"], "cascade");
    assert_eq!(team["nodes"][0]["modelId"], "openai/gpt-5.2");
    assert_eq!(team["nodes"][0]["role"], "primary");
    assert_eq!(team["nodes"][1]["modelId"], "anthropic/claude-haiku-4.5");
    assert_eq!(team["nodes"][1]["role"], "validator");

    let estimate = &body["estimate"];
    assert_eq!(estimate["completionTokens"], 1000);
    assert_eq!(estimate["breakdown"].as_array().map(Vec::len), Some(2));
    // 1000 completion tokens at $14 + $5 per 1M, plus a handful of prompt tokens
    let total = estimate["total"].as_f64().unwrap();
    assert!((0.019..0.0191).contains(&total), "total was {}", total);
}

#[tokio::test]
async fn test_build_team_with_unknown_models_is_rejected() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/teams")
        .json(&json!({ "selections": [{ "modelId": "acme/imaginary-1" }] }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_build_team_rejects_invalid_settings() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/teams")
        .json(&json!({
            "selections": [{
                "modelId": "openai/gpt-5-mini",
                "settings": { "temperature": 5.0 }
            }]
        }))
        .await;

    response.assert_status_bad_request();
    let body: Value = response.json();
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("temperature"));
    assert_eq!(backend.models_request_count().await, 0);
}

#[tokio::test]
async fn test_same_selection_reuses_team_and_catalog() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let first: Value = server.post("/v1/teams").json(&cascade_selection()).await.json();
    let second: Value = server.post("/v1/teams").json(&cascade_selection()).await.json();

    assert_eq!(first["team"]["id"], second["team"]["id"]);
    assert_eq!(backend.models_request_count().await, 1);
}

#[tokio::test]
async fn test_recommend_for_free_user() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let response = server
        .post("/v1/teams/recommend")
        .json(&json!({ "taskType": "general", "userTier": "free" }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["recommendation"]["taskType"], "general");
    assert_eq!(body["recommendation"]["forcedPrimary"], false);
    assert_eq!(
        body["recommendation"]["configs"][0]["modelId"],
        "openai/gpt-4o-mini"
    );
    assert_eq!(body["recommendation"]["configs"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["team"]["strategy"], "sequential");
}

#[tokio::test]
async fn test_recommend_for_starter_builds_cascade() {
    let backend = MockBackendServer::with_default_catalog().await;
    let server = create_test_server(&backend.uri());

    let body: Value = server
        .post("/v1/teams/recommend")
        .json(&json!({ "taskType": "general", "userTier": "starter" }))
        .await
        .json();

    let roles: Vec<&str> = body["recommendation"]["configs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|config| config["role"].as_str().unwrap())
        .collect();
    assert_eq!(roles, vec!["primary", "validator", "fallback"]);
    assert_eq!(body["team"]["strategy"], "cascade");
}

#[tokio::test]
async fn test_catalog_outage_surfaces_retry_details() {
    let backend = MockBackendServer::start().await;
    backend.mock_models_error(503).await;
    let server = create_test_server(&backend.uri());

    let response = server.post("/v1/teams").json(&cascade_selection()).await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "UPSTREAM_ERROR");
    // Light profile: one retry after the first attempt
    assert_eq!(body["error"]["details"]["attempts"], 1);
    assert_eq!(body["error"]["details"]["exhausted"], true);
    assert_eq!(backend.models_request_count().await, 2);
}
