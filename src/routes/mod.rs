//! HTTP routes for Quorum
//!
//! This module defines all HTTP endpoints exposed by the service.

pub mod access;
pub mod health;
pub mod metrics;
pub mod orchestrate;
pub mod teams;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/v1/access", post(access::check_access))
        .route("/v1/teams", post(teams::build_team))
        .route("/v1/teams/recommend", post(teams::recommend_team))
        .route("/v1/orchestrate", post(orchestrate::orchestrate));

    // Public routes (health checks, metrics)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/live", get(health::liveness_check))
        .route("/metrics", get(metrics::prometheus_metrics));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (applied to all routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
