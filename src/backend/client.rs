//! Remote inference backend client
//!
//! HTTP client for the backend that actually runs model teams. All methods
//! return `RequestError` so they can be driven by the `ResilientInvoker`.

use std::pin::Pin;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use tracing::{debug, error, instrument, warn};

use crate::{
    config::Config,
    resilience::RequestError,
    streaming::{SseData, SseDecoder},
};

use super::models::{InferenceRequest, InferenceResponse, ModelInfo, ModelsResponse, StreamChunk};

/// Incremental text of a streamed run
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, RequestError>> + Send>>;

/// Operations the governance layer needs from an inference backend
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Backend name for logs and metrics
    fn name(&self) -> &str;

    /// Run a request and wait for the complete result
    async fn run_inference(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, RequestError>;

    /// Run a request and stream its text.
    ///
    /// Errors before the response starts are returned directly; errors while
    /// streaming arrive as stream items.
    async fn run_inference_stream(
        &self,
        request: &InferenceRequest,
    ) -> Result<TextStream, RequestError>;

    /// Fetch the model catalog
    async fn list_models(&self) -> Result<Vec<ModelInfo>, RequestError>;
}

/// reqwest-based backend client
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl BackendClient {
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self::with_base_url(client, &config.backend_api_url, config.backend_api_key.clone())
    }

    pub fn with_base_url(
        client: reqwest::Client,
        base_url: &str,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build headers with API key authentication
    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            match HeaderValue::from_str(key) {
                Ok(value) => {
                    headers.insert("x-api-key", value);
                }
                Err(_) => warn!("Backend API key is not a valid header value, sending without it"),
            }
        }
        headers
    }

    async fn post_inference(
        &self,
        request: &InferenceRequest,
        accept: &'static str,
    ) -> Result<reqwest::Response, RequestError> {
        request
            .validate()
            .map_err(|msg| RequestError::Status { status: 400, message: msg })?;

        let url = format!("{}/v1/inference", self.base_url);
        debug!(url = %url, stream = request.stream, "Sending inference request");

        let response = self
            .client
            .post(&url)
            .headers(self.headers())
            .header(ACCEPT, accept)
            .json(request)
            .send()
            .await?;

        ensure_success(response, "inference").await
    }
}

/// Map a non-2xx response to `RequestError::Status`
async fn ensure_success(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, RequestError> {
    let status = response.status();
    debug!(status = %status, operation, "Backend response status");

    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    error!(status = %status, body = %text, operation, "Backend request failed");

    let message = if text.is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        text
    };
    Err(RequestError::Status {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl InferenceBackend for BackendClient {
    fn name(&self) -> &str {
        "backend"
    }

    #[instrument(skip(self, request), fields(targets = ?request.model_ids, team_id = ?request.team_id))]
    async fn run_inference(
        &self,
        request: &InferenceRequest,
    ) -> Result<InferenceResponse, RequestError> {
        let response = self.post_inference(request, "application/json").await?;

        let body = response.text().await?;
        let result: InferenceResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse inference response");
            RequestError::from(e)
        })?;

        debug!(outputs = result.model_outputs.len(), "Inference completed");
        Ok(result)
    }

    #[instrument(skip(self, request), fields(targets = ?request.model_ids, team_id = ?request.team_id))]
    async fn run_inference_stream(
        &self,
        request: &InferenceRequest,
    ) -> Result<TextStream, RequestError> {
        let mut request = request.clone();
        request.stream = true;

        let response = self.post_inference(&request, "text/event-stream").await?;
        let bytes = response.bytes_stream();

        let stream = async_stream::try_stream! {
            let mut decoder = SseDecoder::new();
            let mut finished = false;
            futures::pin_mut!(bytes);

            'chunks: while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(RequestError::from)?;
                for data in decoder.feed(&chunk) {
                    match data {
                        SseData::Done => {
                            finished = true;
                            break 'chunks;
                        }
                        SseData::Payload(payload) => {
                            let parsed: StreamChunk =
                                serde_json::from_str(&payload).map_err(RequestError::from)?;
                            yield parsed.text;
                        }
                    }
                }
            }

            if !finished {
                debug!("Stream ended without completion marker");
                if let Some(SseData::Payload(payload)) = decoder.finish() {
                    let parsed: StreamChunk =
                        serde_json::from_str(&payload).map_err(RequestError::from)?;
                    yield parsed.text;
                }
            }
        };

        Ok(Box::pin(stream))
    }

    #[instrument(skip(self))]
    async fn list_models(&self) -> Result<Vec<ModelInfo>, RequestError> {
        let url = format!("{}/v1/models", self.base_url);
        debug!(url = %url, "Fetching model catalog");

        let response = self
            .client
            .get(&url)
            .headers(self.headers())
            .send()
            .await?;
        let response = ensure_success(response, "list_models").await?;

        let body = response.text().await?;
        let result: ModelsResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse model catalog");
            RequestError::from(e)
        })?;

        debug!(models = result.data.len(), "Fetched model catalog");
        Ok(result.data)
    }
}

/// Drain a text stream into one string
pub async fn collect_stream(mut stream: TextStream) -> Result<String, RequestError> {
    let mut text = String::new();
    while let Some(chunk) = stream.next().await {
        text.push_str(&chunk?);
    }
    Ok(text)
}
