//! Error types for Quorum
//!
//! Service-level errors and their HTTP mapping. Access and usage denials for
//! individual models are not errors; they are `AccessDecision` values.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::resilience::{InvokeError, RequestError};

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Every selected model was denied for the user
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Usage blocked: {message}")]
    UsageBlocked { message: String, usage_percent: f64 },

    #[error("Upstream error: {0}")]
    Upstream(#[from] InvokeError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Additional error details for usage blocks and failed invocations
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exhausted: Option<bool>,
}

impl AppError {
    fn upstream_status(err: &InvokeError) -> (StatusCode, &'static str) {
        match &err.source {
            RequestError::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "REQUEST_CANCELLED"),
            RequestError::Timeout => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT"),
            _ => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "BAD_REQUEST",
                msg.clone(),
                None,
            ),
            AppError::AccessDenied(msg) => (
                StatusCode::FORBIDDEN,
                "ACCESS_DENIED",
                msg.clone(),
                None,
            ),
            AppError::UsageBlocked {
                message,
                usage_percent,
            } => (
                StatusCode::TOO_MANY_REQUESTS,
                "USAGE_BLOCKED",
                message.clone(),
                Some(ErrorDetails {
                    usage_percent: Some(*usage_percent),
                    ..ErrorDetails::default()
                }),
            ),
            AppError::Upstream(err) => {
                let (status, code) = Self::upstream_status(err);
                (
                    status,
                    code,
                    err.user_message(),
                    Some(ErrorDetails {
                        attempts: Some(err.retry.attempts),
                        total_time_ms: Some(err.retry.total_time_ms),
                        exhausted: Some(err.retry.exhausted),
                        ..ErrorDetails::default()
                    }),
                )
            }
            AppError::JsonError(_) => (
                StatusCode::BAD_REQUEST,
                "INVALID_JSON",
                "Invalid JSON in request".to_string(),
                None,
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
