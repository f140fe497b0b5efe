//! Mock inference backend for testing
//!
//! Provides wiremock-based mocks for the backend endpoints:
//! - GET /v1/models - Model catalog
//! - POST /v1/inference - Run a team (JSON or server-sent events)
//!
//! # Example
//!
//! ```rust,ignore
//! use crate::mocks::backend::{BackendTestData, MockBackendServer};
//!
//! #[tokio::test]
//! async fn test_with_backend_mock() {
//!     let backend = MockBackendServer::start().await;
//!     backend.mock_models(BackendTestData::default_catalog()).await;
//!     backend.mock_inference_success("Hello").await;
//!
//!     // Use backend.uri() as BACKEND_API_URL
//! }
//! ```

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const INFERENCE_PATH: &str = "/v1/inference";
pub const MODELS_PATH: &str = "/v1/models";

/// Mock backend server wrapper
pub struct MockBackendServer {
    server: MockServer,
}

impl MockBackendServer {
    /// Start a new mock backend server
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        Self { server }
    }

    /// Start a server that already serves the default catalog
    pub async fn with_default_catalog() -> Self {
        let server = Self::start().await;
        server.mock_models(BackendTestData::default_catalog()).await;
        server
    }

    /// Get the mock server URI
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Underlying server, for tests that mount their own matchers
    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Get all received requests (for assertion in tests)
    pub async fn received_requests(&self) -> Vec<wiremock::Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Bodies of all inference requests, in arrival order
    pub async fn inference_bodies(&self) -> Vec<Value> {
        self.received_requests()
            .await
            .into_iter()
            .filter(|r| r.url.path() == INFERENCE_PATH)
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    /// Number of catalog fetches
    pub async fn models_request_count(&self) -> usize {
        self.received_requests()
            .await
            .iter()
            .filter(|r| r.url.path() == MODELS_PATH)
            .count()
    }

    // =========================================================================
    // GET /v1/models - Model catalog
    // =========================================================================

    /// Mock successful catalog response
    pub async fn mock_models(&self, models: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(MODELS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": models })))
            .mount(&self.server)
            .await;
    }

    /// Mock catalog error response
    pub async fn mock_models_error(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path(MODELS_PATH))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "error": "catalog unavailable" })),
            )
            .mount(&self.server)
            .await;
    }

    // =========================================================================
    // POST /v1/inference - Team execution
    // =========================================================================

    /// Mock successful inference response
    pub async fn mock_inference_success(&self, content: &str) {
        Mock::given(method("POST"))
            .and(path(INFERENCE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(BackendTestData::inference(content)),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock an error status for every inference request
    pub async fn mock_inference_error(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(INFERENCE_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string("backend failure"))
            .mount(&self.server)
            .await;
    }

    /// Mock an error status for the first `times` inference requests.
    ///
    /// Takes precedence over other inference mocks until used up, so
    /// combine with `mock_inference_success` for "fail then succeed".
    pub async fn mock_inference_error_times(&self, status: u16, times: u64) {
        Mock::given(method("POST"))
            .and(path(INFERENCE_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string("transient failure"))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Mock an inference response that arrives after `delay`
    pub async fn mock_inference_delayed(&self, content: &str, delay: Duration) {
        Mock::given(method("POST"))
            .and(path(INFERENCE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(BackendTestData::inference(content))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a streamed inference response with one event per chunk
    pub async fn mock_inference_stream(&self, chunks: &[&str]) {
        Mock::given(method("POST"))
            .and(path(INFERENCE_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(BackendTestData::sse_body(chunks), "text/event-stream"),
            )
            .mount(&self.server)
            .await;
    }

    /// Mock a streamed response with an arbitrary raw body
    pub async fn mock_inference_stream_raw(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path(INFERENCE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(&self.server)
            .await;
    }
}

/// Canned backend payloads
pub struct BackendTestData;

impl BackendTestData {
    pub fn model(id: &str, prompt_per_1m: f64, completion_per_1m: f64) -> Value {
        let (provider, name) = id.split_once('/').unwrap_or(("unknown", id));
        json!({
            "id": id,
            "name": name,
            "provider": provider,
            "capabilities": ["chat"],
            "pricing": {
                "promptPer1M": prompt_per_1m,
                "completionPer1M": completion_per_1m
            },
            "contextWindow": 128000
        })
    }

    /// Catalog with representatives of every cost tier
    pub fn default_catalog() -> Vec<Value> {
        vec![
            Self::model("openai/gpt-4o-mini", 0.15, 0.6),
            Self::model("google/gemini-2.0-flash", 0.1, 0.4),
            Self::model("meta-llama/llama-3.1-8b", 0.05, 0.08),
            Self::model("openai/gpt-5-mini", 0.25, 2.0),
            Self::model("anthropic/claude-haiku-4.5", 1.0, 5.0),
            Self::model("google/gemini-2.5-flash", 0.3, 2.5),
            Self::model("openai/gpt-5.2", 1.75, 14.0),
            Self::model("anthropic/claude-sonnet-4.5", 3.0, 15.0),
            Self::model("google/gemini-2.5-pro", 1.25, 10.0),
            Self::model("openai/gpt-5.2-pro", 21.0, 168.0),
            Self::model("anthropic/claude-opus-4.5", 5.0, 25.0),
        ]
    }

    pub fn inference(content: &str) -> Value {
        json!({
            "content": content,
            "modelOutputs": [],
            "usage": { "promptTokens": 12, "completionTokens": 34 }
        })
    }

    pub fn sse_body(chunks: &[&str]) -> String {
        let mut body = String::new();
        for chunk in chunks {
            body.push_str(&format!("data: {}\n\n", json!({ "text": chunk })));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }
}
