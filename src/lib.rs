//! Quorum - Governance and resilience for multi-model AI orchestration
//!
//! This library decides which models a user may run (subscription tier and
//! quota usage), assembles role-tagged model teams, estimates their cost and
//! invokes a remote inference backend with timeouts, cancellation and retry.

pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod policy;
pub mod resilience;
pub mod routes;
pub mod streaming;
pub mod teams;
pub mod tiers;
pub mod tokens;
pub mod usage;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::backend::{BackendClient, InferenceBackend};
pub use crate::catalog::CatalogCache;
pub use crate::config::Config;
pub use crate::pipeline::Pipeline;
pub use crate::policy::Policy;
pub use crate::resilience::ResilientInvoker;
pub use crate::teams::{TeamAssembler, TeamRecommender};
pub use crate::tokens::TokenEstimator;
pub use crate::usage::UsageGovernor;

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub policy: Arc<Policy>,
    pub start_time: Instant,
    /// Remote inference backend
    pub backend: Arc<dyn InferenceBackend>,
    /// Model catalog with TTL, refreshed under the light retry profile
    pub catalog: Arc<CatalogCache>,
    pub governor: UsageGovernor,
    pub recommender: TeamRecommender,
    /// Governance + invocation pipeline under the standard retry profile
    pub pipeline: Pipeline,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: Config, policy: Policy) -> Result<Self> {
        // Initialize HTTP client with connection pooling; per-attempt
        // timeouts are enforced by the invoker
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(100)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()?;

        let backend: Arc<dyn InferenceBackend> =
            Arc::new(BackendClient::new(http_client, &config));

        Self::with_backend(config, policy, backend)
    }

    fn with_backend(
        config: Config,
        policy: Policy,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self> {
        let policy = Arc::new(policy);

        let catalog = Arc::new(CatalogCache::new(
            Arc::clone(&backend),
            ResilientInvoker::new(config.light_retry.clone()),
            config.catalog_ttl(),
        ));

        let pipeline = Pipeline::new(
            Arc::clone(&policy),
            TeamAssembler::in_memory(),
            Arc::clone(&catalog),
            Arc::clone(&backend),
            ResilientInvoker::new(config.standard_retry.clone()),
            TokenEstimator::new()?,
        );

        Ok(Self {
            governor: UsageGovernor::new(Arc::clone(&policy)),
            recommender: TeamRecommender::new(Arc::clone(&policy)),
            config,
            policy,
            start_time: Instant::now(),
            backend,
            catalog,
            pipeline,
        })
    }

    /// Create a new application state for testing with a given backend.
    ///
    /// The backend is usually a `BackendClient` pointed at a wiremock server.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        policy: Policy,
        backend: Arc<dyn InferenceBackend>,
    ) -> Result<Self> {
        Self::with_backend(config, policy, backend)
    }
}
