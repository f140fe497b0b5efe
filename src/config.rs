//! Configuration management for Quorum
//!
//! Configuration is loaded from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::resilience::RetryConfig;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Inference backend base URL
    pub backend_api_url: String,
    /// Inference backend API key, sent as `x-api-key`
    pub backend_api_key: Option<String>,

    /// Model catalog cache TTL (in seconds)
    pub catalog_ttl_seconds: u64,

    /// Governance policy JSON file replacing the built-in tables
    pub policy_path: Option<String>,

    /// Retry profile for inference calls
    pub standard_retry: RetryConfig,
    /// Retry profile for catalog refreshes
    pub light_retry: RetryConfig,
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}", name)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let standard = RetryConfig::standard();
        let standard_retry = RetryConfig {
            max_retries: parse_var("STANDARD_RETRY_MAX_RETRIES", standard.max_retries)?,
            timeout_ms: parse_var("STANDARD_RETRY_TIMEOUT_MS", standard.timeout_ms)?,
            ..standard
        };

        Ok(Self {
            host: env::var("QUORUM_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("QUORUM_PORT", 8080)?,

            backend_api_url: env::var("BACKEND_API_URL")
                .context("BACKEND_API_URL must be set")?,
            backend_api_key: env::var("BACKEND_API_KEY").ok().filter(|key| !key.is_empty()),

            catalog_ttl_seconds: parse_var("CATALOG_TTL_SECONDS", 300)?,

            policy_path: env::var("QUORUM_POLICY_PATH").ok().filter(|path| !path.is_empty()),

            standard_retry,
            light_retry: RetryConfig::light(),
        })
    }

    pub fn catalog_ttl(&self) -> Duration {
        Duration::from_secs(self.catalog_ttl_seconds)
    }

    /// Configuration pointing at a given backend, for tests
    #[cfg(any(test, feature = "test-utils"))]
    pub fn for_backend(backend_api_url: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            backend_api_url: backend_api_url.to_string(),
            backend_api_key: Some("test-key".to_string()),
            catalog_ttl_seconds: 300,
            policy_path: None,
            standard_retry: RetryConfig::standard(),
            light_retry: RetryConfig::light(),
        }
    }
}
