//! Resilient invocation of remote calls
//!
//! Runs a request function under a per-attempt timeout and a cancellation
//! token, retrying retryable failures with capped exponential backoff plus
//! jitter. Attempts are strictly sequential: the next attempt is only issued
//! after the previous one has finished, timed out, or been dropped.

use std::future::Future;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{
    error::{FailureClass, InvokeError, RequestError, RetryInfo},
    observer::{RetryEvent, RetryObserver},
    policy::RetryConfig,
};

/// Successful invocation with its retry metadata
#[derive(Debug, Clone)]
pub struct Invoked<T> {
    pub result: T,
    pub retry: RetryInfo,
}

/// Retrying executor for one class of calls
#[derive(Debug, Clone)]
pub struct ResilientInvoker {
    config: RetryConfig,
}

impl ResilientInvoker {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn standard() -> Self {
        Self::new(RetryConfig::standard())
    }

    pub fn light() -> Self {
        Self::new(RetryConfig::light())
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Execute `request_fn` until it succeeds, fails terminally, runs out of
    /// retries, or `cancel` fires.
    ///
    /// Timing out drops the in-flight future, which aborts the underlying
    /// network operation. Cancellation aborts the pending attempt or backoff
    /// sleep and suppresses further retries.
    pub async fn execute<T, F, Fut>(
        &self,
        mut request_fn: F,
        cancel: &CancellationToken,
        observer: Option<&dyn RetryObserver>,
    ) -> Result<Invoked<T>, InvokeError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RequestError>>,
    {
        let started = Instant::now();
        let attempt_timeout = self.config.attempt_timeout();
        let mut attempt: u32 = 0;
        let mut last_error: Option<String> = None;

        loop {
            if cancel.is_cancelled() {
                return Err(self.fail(RequestError::Cancelled, attempt, started, false));
            }

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(RequestError::Cancelled),
                result = tokio::time::timeout(attempt_timeout, request_fn()) => {
                    result.unwrap_or(Err(RequestError::Timeout))
                }
            };

            let failure = match outcome {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            retries = attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(Invoked {
                        result,
                        retry: RetryInfo {
                            attempts: attempt,
                            total_time_ms: started.elapsed().as_millis() as u64,
                            exhausted: false,
                            last_error,
                        },
                    });
                }
                Err(failure) => failure,
            };

            match failure.classify() {
                FailureClass::Terminal => {
                    if failure == RequestError::Cancelled {
                        debug!(retries = attempt, "Request cancelled by caller");
                    } else {
                        error!(error = %failure, retries = attempt, "Request failed with terminal error");
                    }
                    return Err(self.fail(failure, attempt, started, false));
                }
                FailureClass::Retryable if attempt >= self.config.max_retries => {
                    error!(
                        error = %failure,
                        retries = attempt,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Request failed, retries exhausted"
                    );
                    return Err(self.fail(failure, attempt, started, true));
                }
                FailureClass::Retryable => {}
            }

            let delay = self.config.jittered_delay(attempt, rand::random::<f64>());
            let message = failure.to_string();

            warn!(
                error = %message,
                attempt = attempt + 1,
                max_retries = self.config.max_retries,
                delay_ms = delay.as_millis() as u64,
                "Retryable failure, backing off"
            );
            metrics::counter!("quorum_retries_total").increment(1);

            if let Some(observer) = observer {
                observer.on_retry(&RetryEvent {
                    attempt: attempt + 1,
                    delay,
                    error: message.clone(),
                });
            }
            last_error = Some(message);

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(retries = attempt, "Request cancelled during backoff");
                    return Err(self.fail(RequestError::Cancelled, attempt, started, false));
                }
                _ = tokio::time::sleep(delay) => {}
            }

            attempt += 1;
        }
    }

    fn fail(&self, source: RequestError, attempts: u32, started: Instant, exhausted: bool) -> InvokeError {
        let last_error = Some(source.to_string());
        InvokeError {
            source,
            retry: RetryInfo {
                attempts,
                total_time_ms: started.elapsed().as_millis() as u64,
                exhausted,
                last_error,
            },
        }
    }
}

impl Default for ResilientInvoker {
    fn default() -> Self {
        Self::standard()
    }
}
