//! Prometheus metrics endpoint
//!
//! Exposes governance and invocation metrics in Prometheus format.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use tracing::debug;

/// Global Prometheus handle for metrics export.
///
/// Installing the recorder fails when another recorder is already set (for
/// example a second test in the same process); the handle still renders.
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    let recorder = PrometheusBuilder::new().build_recorder();
    let handle = recorder.handle();
    if metrics::set_global_recorder(recorder).is_err() {
        debug!("Metrics recorder already installed");
    }
    handle
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "quorum_access_denials_total",
        "Model access denials by kind (subscription or usage)"
    );
    metrics::describe_counter!(
        "quorum_usage_blocks_total",
        "Requests refused because the usage quota was reached"
    );
    metrics::describe_counter!(
        "quorum_retries_total",
        "Retries performed by the resilient invoker"
    );
    metrics::describe_counter!(
        "quorum_invocations_total",
        "Backend invocations by outcome and strategy"
    );
    metrics::describe_histogram!(
        "quorum_invocation_duration_seconds",
        "Backend invocation duration in seconds, retries included"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record one backend invocation
pub fn record_invocation(outcome: &str, strategy: &str, duration_secs: f64) {
    metrics::counter!(
        "quorum_invocations_total",
        "outcome" => outcome.to_string(),
        "strategy" => strategy.to_string()
    )
    .increment(1);
    metrics::histogram!("quorum_invocation_duration_seconds", "strategy" => strategy.to_string())
        .record(duration_secs);
}
