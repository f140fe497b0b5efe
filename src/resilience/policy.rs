//! Retry profiles and backoff computation

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Retry behaviour of one class of calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of the delay added as random jitter (0.0 disables it)
    pub jitter_factor: f64,
    /// Wall-clock limit of a single attempt
    pub timeout_ms: u64,
}

impl RetryConfig {
    /// Profile for primary inference calls
    pub fn standard() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 10_000,
            jitter_factor: 0.3,
            timeout_ms: 60_000,
        }
    }

    /// Profile for secondary calls (catalog refresh, settings persistence)
    pub fn light() -> Self {
        Self {
            max_retries: 1,
            base_delay_ms: 500,
            max_delay_ms: 2_000,
            jitter_factor: 0.2,
            timeout_ms: 10_000,
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// `min(base * 2^attempt_index, max)`, before jitter
    pub fn backoff_delay(&self, attempt_index: u32) -> Duration {
        let exponential = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt_index));
        Duration::from_millis(exponential.min(self.max_delay_ms))
    }

    /// Backoff plus `delay * jitter_factor * random`, `random` in [0, 1)
    pub fn jittered_delay(&self, attempt_index: u32, random: f64) -> Duration {
        let delay = self.backoff_delay(attempt_index);
        let jitter = (self.jitter_factor * random.clamp(0.0, 1.0)).max(0.0);
        delay + delay.mul_f64(jitter)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::standard()
    }
}
