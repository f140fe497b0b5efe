//! Orchestration endpoint
//!
//! Runs the full pipeline. Dropping the request (client disconnect) cancels
//! the in-flight backend attempt or backoff sleep.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use futures::StreamExt;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn, Instrument};
use uuid::Uuid;

use crate::{
    error::AppResult,
    pipeline::{OrchestrationRequest, PipelineStream},
    resilience::RetryEvent,
    AppState,
};

/// POST /v1/orchestrate
pub async fn orchestrate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OrchestrationRequest>,
) -> AppResult<Response> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("orchestrate", request_id = %request_id, stream = request.stream);

    async move {
        let cancel = CancellationToken::new();
        let cancel_on_drop = cancel.clone().drop_guard();

        let observer = |event: &RetryEvent| {
            info!(
                attempt = event.attempt,
                delay_ms = event.delay.as_millis() as u64,
                error = %event.error,
                "Retrying orchestration"
            );
        };

        if request.stream {
            let streamed = state
                .pipeline
                .run_stream(&request, &cancel, Some(&observer))
                .await?;
            return Ok(sse_response(streamed, cancel_on_drop));
        }

        let outcome = state
            .pipeline
            .run(&request, &cancel, Some(&observer))
            .await?;
        Ok(Json(outcome).into_response())
    }
    .instrument(span)
    .await
}

/// `team` event with the prepared run, `delta` events with text, then `done`
fn sse_response(streamed: PipelineStream, cancel_on_drop: DropGuard) -> Response {
    let PipelineStream {
        prepared,
        retry,
        mut stream,
    } = streamed;

    let events = async_stream::stream! {
        // Client disconnect drops the stream and cancels the run
        let _cancel_on_drop = cancel_on_drop;
        yield Event::default().event("team").json_data(&prepared);
        yield Event::default().event("retry").json_data(&retry);

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(text) => yield Ok(Event::default().event("delta").data(text)),
                Err(e) => {
                    warn!(error = %e, "Inference stream failed");
                    yield Ok(Event::default().event("error").data(e.to_string()));
                    return;
                }
            }
        }

        yield Ok(Event::default().event("done").data("[DONE]"));
    };

    Sse::new(events)
        .keep_alive(KeepAlive::default())
        .into_response()
}
