//! Backend client tests against a mock server

use pretty_assertions::assert_eq;
use quorum::{
    backend::{collect_stream, BackendClient, InferenceBackend, InferenceRequest},
    resilience::{ChannelObserver, RequestError, ResilientInvoker},
    teams::OrchestrationSettings,
};
use tokio_util::sync::CancellationToken;
use wiremock::{
    matchers::{header, method, path},
    Mock, ResponseTemplate,
};

use crate::common::{constants::TEST_BACKEND_API_KEY, fast_retry};
use crate::mocks::{BackendTestData, MockBackendServer, MODELS_PATH};

fn client_for(backend: &MockBackendServer) -> BackendClient {
    BackendClient::with_base_url(
        reqwest::Client::new(),
        &backend.uri(),
        Some(TEST_BACKEND_API_KEY.to_string()),
    )
}

fn request() -> InferenceRequest {
    InferenceRequest::for_models(
        "Hello",
        vec!["openai/gpt-4o-mini".to_string()],
        OrchestrationSettings::default(),
    )
}

#[tokio::test]
async fn test_list_models_sends_api_key() {
    let backend = MockBackendServer::start().await;
    Mock::given(method("GET"))
        .and(path(MODELS_PATH))
        .and(header("x-api-key", TEST_BACKEND_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": BackendTestData::default_catalog()
        })))
        .expect(1)
        .mount(backend.server())
        .await;

    let models = client_for(&backend).list_models().await.unwrap();

    assert_eq!(models.len(), 11);
    assert_eq!(models[0].id, "openai/gpt-4o-mini");
    assert_eq!(models[0].provider, "openai");
    let pricing = models[0].pricing.clone().unwrap();
    assert_eq!(pricing.prompt_per_1m, Some(0.15));
}

#[tokio::test]
async fn test_server_error_maps_to_retryable_status() {
    let backend = MockBackendServer::start().await;
    backend.mock_inference_error(500).await;

    let err = client_for(&backend).run_inference(&request()).await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.is_retryable());
    assert!(err.to_string().contains("backend failure"));
}

#[tokio::test]
async fn test_stream_collects_text() {
    let backend = MockBackendServer::start().await;
    backend.mock_inference_stream(&["Hel", "lo"]).await;

    let stream = client_for(&backend)
        .run_inference_stream(&request())
        .await
        .unwrap();

    assert_eq!(collect_stream(stream).await.unwrap(), "Hello");
}

#[tokio::test]
async fn test_stream_without_done_marker_flushes_last_line() {
    let backend = MockBackendServer::start().await;
    backend
        .mock_inference_stream_raw("data: {\"text\":\"Hi\"}\n\ndata: {\"text\":\" there\"}")
        .await;

    let stream = client_for(&backend)
        .run_inference_stream(&request())
        .await
        .unwrap();

    assert_eq!(collect_stream(stream).await.unwrap(), "Hi there");
}

#[tokio::test]
async fn test_malformed_stream_payload_is_decode_error() {
    let backend = MockBackendServer::start().await;
    backend.mock_inference_stream_raw("data: not-json\n\n").await;

    let stream = client_for(&backend)
        .run_inference_stream(&request())
        .await
        .unwrap();

    let err = collect_stream(stream).await.unwrap_err();
    assert!(matches!(err, RequestError::Decode(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_connection_refused_is_retryable() {
    let client = BackendClient::with_base_url(reqwest::Client::new(), "http://127.0.0.1:1", None);

    let err = client.list_models().await.unwrap_err();

    assert!(err.is_retryable(), "got {:?}", err);
}

#[tokio::test]
async fn test_invalid_request_is_rejected_locally() {
    let backend = MockBackendServer::start().await;
    let mut both = request();
    both.team_id = Some("team-1".to_string());

    let err = client_for(&backend).run_inference(&both).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(!err.is_retryable());
    assert!(backend.received_requests().await.is_empty());
}

#[tokio::test]
async fn test_invoker_retries_client_until_success() {
    let backend = MockBackendServer::start().await;
    backend.mock_inference_error_times(502, 2).await;
    backend.mock_inference_success("Hello").await;

    let client = client_for(&backend);
    let invoker = ResilientInvoker::new(fast_retry(3, 2_000));
    let (observer, mut events) = ChannelObserver::new(8);
    let request = request();

    let invoked = invoker
        .execute(
            || client.run_inference(&request),
            &CancellationToken::new(),
            Some(&observer),
        )
        .await
        .unwrap();

    assert_eq!(invoked.result.content, "Hello");
    assert_eq!(invoked.retry.attempts, 2);
    assert!(!invoked.retry.exhausted);

    let first = events.recv().await.unwrap();
    assert_eq!(first.attempt, 1);
    assert!(first.error.contains("502"));
}

#[tokio::test]
async fn test_cancelled_invocation_sends_nothing() {
    let backend = MockBackendServer::start().await;
    backend.mock_inference_success("Hello").await;

    let client = client_for(&backend);
    let invoker = ResilientInvoker::new(fast_retry(3, 2_000));
    let cancel = CancellationToken::new();
    cancel.cancel();
    let request = request();

    let err = invoker
        .execute(|| client.run_inference(&request), &cancel, None)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.retry.attempts, 0);
    assert!(backend.received_requests().await.is_empty());
}
