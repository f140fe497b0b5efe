//! Access decision endpoint
//!
//! Answers "may this user use this model right now?" without running anything.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{AppError, AppResult},
    pipeline::UsageStatus,
    tiers::{AccessTier, CostTier, ModelProfile},
    usage::AccessDecision,
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    pub model_id: String,
    #[serde(default)]
    pub user_tier: AccessTier,
    #[serde(default)]
    pub usage_percent: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessResponse {
    pub decision: AccessDecision,
    pub profile: ModelProfile,
    pub allowed_cost_tiers: Vec<CostTier>,
    pub should_block: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageStatus>,
}

/// POST /v1/access
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AccessRequest>,
) -> AppResult<Json<AccessResponse>> {
    if request.model_id.trim().is_empty() {
        return Err(AppError::BadRequest("modelId must not be empty".to_string()));
    }
    if !request.usage_percent.is_finite() || request.usage_percent < 0.0 {
        return Err(AppError::BadRequest(
            "usagePercent must be a non-negative number".to_string(),
        ));
    }

    let governor = &state.governor;
    let decision =
        governor.can_use_model_with_usage(&request.model_id, request.usage_percent, request.user_tier);
    debug!(
        model = %request.model_id,
        tier = %request.user_tier,
        allowed = decision.allowed,
        "Access checked"
    );

    Ok(Json(AccessResponse {
        decision,
        profile: governor.access().classifier().profile(&request.model_id),
        allowed_cost_tiers: governor.allowed_cost_tiers(request.usage_percent),
        should_block: governor.should_block(request.usage_percent),
        usage: UsageStatus::for_usage(&state.policy, request.usage_percent),
    }))
}
