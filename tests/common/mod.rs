//! Common test utilities for Quorum
//!
//! Shared fixtures for building an `AppState` and test server against a
//! mocked backend.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use quorum::{
    backend::BackendClient, resilience::RetryConfig, routes::create_router, AppState, Config,
    Policy,
};

/// Test configuration constants
pub mod constants {
    /// API key the test backend client sends
    pub const TEST_BACKEND_API_KEY: &str = "test-key";
}

/// Retry profile with millisecond backoff so retry tests stay fast
pub fn fast_retry(max_retries: u32, timeout_ms: u64) -> RetryConfig {
    RetryConfig {
        max_retries,
        base_delay_ms: 1,
        max_delay_ms: 5,
        jitter_factor: 0.0,
        timeout_ms,
    }
}

/// Config pointing at a mock backend, with fast retry profiles
pub fn test_config(backend_url: &str) -> Config {
    let mut config = Config::for_backend(backend_url);
    config.backend_api_key = Some(constants::TEST_BACKEND_API_KEY.to_string());
    config.standard_retry = fast_retry(3, 2_000);
    config.light_retry = fast_retry(1, 2_000);
    config
}

pub fn create_test_state_with(config: Config) -> Arc<AppState> {
    let backend = Arc::new(BackendClient::with_base_url(
        reqwest::Client::new(),
        &config.backend_api_url,
        config.backend_api_key.clone(),
    ));
    Arc::new(
        AppState::new_for_testing(config, Policy::default(), backend)
            .expect("Failed to create test state"),
    )
}

pub fn create_test_state(backend_url: &str) -> Arc<AppState> {
    create_test_state_with(test_config(backend_url))
}

pub fn create_test_server_with(config: Config) -> TestServer {
    TestServer::new(create_router(create_test_state_with(config)))
        .expect("Failed to create test server")
}

pub fn create_test_server(backend_url: &str) -> TestServer {
    create_test_server_with(test_config(backend_url))
}
