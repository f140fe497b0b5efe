//! Failure taxonomy for remote calls

use serde::Serialize;
use thiserror::Error;

/// Failure of a single attempt
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Remote error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// Whether a failed attempt may be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Terminal,
}

impl RequestError {
    /// Classify the failure.
    ///
    /// Connectivity failures, timeouts, 5xx and 429 are retryable; other 4xx
    /// are terminal; caller cancellation is terminal. Anything unrecognized is
    /// retryable and stays bounded by the retry budget.
    pub fn classify(&self) -> FailureClass {
        match self {
            RequestError::Connect(_) | RequestError::Timeout => FailureClass::Retryable,
            RequestError::Status { status, .. } => {
                if *status == 429 || (500..600).contains(status) {
                    FailureClass::Retryable
                } else if (400..500).contains(status) {
                    FailureClass::Terminal
                } else {
                    FailureClass::Retryable
                }
            }
            RequestError::Cancelled => FailureClass::Terminal,
            RequestError::Decode(_) | RequestError::Other(_) => FailureClass::Retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.classify() == FailureClass::Retryable
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RequestError::Timeout
        } else if err.is_connect() {
            RequestError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            RequestError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else if err.is_decode() {
            RequestError::Decode(err.to_string())
        } else {
            RequestError::Other(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::Decode(err.to_string())
    }
}

/// Retry metadata attached to every invocation outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryInfo {
    /// Retries performed after the first attempt
    pub attempts: u32,
    pub total_time_ms: u64,
    /// True when the call failed because the retry budget ran out
    pub exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl RetryInfo {
    /// Attempts made including the first one
    pub fn total_attempts(&self) -> u32 {
        self.attempts + 1
    }
}

/// The final error of an invocation, annotated with retry metadata
#[derive(Debug, Clone, Error)]
#[error("{source} (retries: {}, elapsed: {}ms, exhausted: {})", .retry.attempts, .retry.total_time_ms, .retry.exhausted)]
pub struct InvokeError {
    pub source: RequestError,
    pub retry: RetryInfo,
}

impl InvokeError {
    pub fn is_cancelled(&self) -> bool {
        self.source == RequestError::Cancelled
    }

    /// Message suitable for showing to an end user
    pub fn user_message(&self) -> String {
        if self.retry.exhausted {
            format!(
                "The request failed after {} attempts. Please try again later.",
                self.retry.total_attempts()
            )
        } else if self.is_cancelled() {
            "The request was cancelled.".to_string()
        } else {
            self.source.to_string()
        }
    }
}
