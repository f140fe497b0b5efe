//! Health check endpoints
//!
//! - `/health` - Full health check with policy and catalog status
//! - `/health/live` - Liveness probe

use std::sync::Arc;
use std::time::Instant;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::AppState;

/// Health status enum
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual check result
#[derive(Debug, Serialize)]
pub struct DependencyCheck {
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Checks collection
#[derive(Debug, Serialize)]
pub struct DependencyChecks {
    pub policy: DependencyCheck,
    pub catalog: DependencyCheck,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: String,
    pub checks: DependencyChecks,
}

/// Simple health response for liveness
#[derive(Debug, Serialize)]
pub struct SimpleHealthResponse {
    pub status: HealthStatus,
}

/// Policy defects degrade decisions but never fail requests
fn check_policy(state: &AppState) -> DependencyCheck {
    let start = Instant::now();
    let defects = state.policy.validate();

    DependencyCheck {
        status: if defects.is_empty() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        latency_ms: start.elapsed().as_millis() as u64,
        error: (!defects.is_empty()).then(|| defects.join("; ")),
    }
}

/// The catalog is the only remote dependency needed before a request runs
async fn check_catalog(state: &AppState) -> DependencyCheck {
    let start = Instant::now();

    match state.catalog.get_models(&CancellationToken::new()).await {
        Ok(models) if models.is_empty() => DependencyCheck {
            status: HealthStatus::Degraded,
            latency_ms: start.elapsed().as_millis() as u64,
            error: Some("Model catalog is empty".to_string()),
        },
        Ok(_) => DependencyCheck {
            status: HealthStatus::Healthy,
            latency_ms: start.elapsed().as_millis() as u64,
            error: None,
        },
        Err(e) => DependencyCheck {
            status: HealthStatus::Unhealthy,
            latency_ms: start.elapsed().as_millis() as u64,
            error: Some(e.to_string()),
        },
    }
}

/// Full health check endpoint
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<HealthResponse>) {
    let policy_check = check_policy(&state);
    let catalog_check = check_catalog(&state).await;

    let overall_status = if catalog_check.status == HealthStatus::Unhealthy {
        HealthStatus::Unhealthy
    } else if policy_check.status != HealthStatus::Healthy
        || catalog_check.status != HealthStatus::Healthy
    {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status: overall_status.clone(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        checks: DependencyChecks {
            policy: policy_check,
            catalog: catalog_check,
        },
    };

    let status_code = match overall_status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Liveness probe endpoint
pub async fn liveness_check() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: HealthStatus::Healthy,
        }),
    )
}
