//! Team endpoints
//!
//! Team previews with cost estimates, and task-based recommendations.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    error::{AppError, AppResult},
    teams::{
        estimate_team_cost, settings::DEFAULT_MAX_TOKENS, CostEstimate, OrchestrationTeam,
        SelectedModelConfig, TaskType, TeamAssembler, TeamRecommendation,
    },
    tiers::AccessTier,
    AppState,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildTeamRequest {
    pub selections: Vec<SelectedModelConfig>,
    #[serde(default)]
    pub name: Option<String>,
    /// Prompt used for the token estimate
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub completion_tokens: Option<u64>,
}

impl BuildTeamRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.selections.is_empty() {
            return Err("at least one model must be selected".to_string());
        }
        if self.completion_tokens == Some(0) {
            return Err("completionTokens must be greater than zero".to_string());
        }
        for selection in &self.selections {
            selection
                .settings
                .validate()
                .map_err(|e| format!("{}: {}", selection.model_id, e))?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponse {
    pub team: OrchestrationTeam,
    pub estimate: CostEstimate,
}

/// POST /v1/teams
pub async fn build_team(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BuildTeamRequest>,
) -> AppResult<Json<TeamResponse>> {
    request.validate().map_err(AppError::BadRequest)?;

    let catalog = state.catalog.get_models(&CancellationToken::new()).await?;
    let name = request.name.as_deref().unwrap_or("Custom team");
    let team = state
        .pipeline
        .assembler()
        .assemble(&catalog, &request.selections, name);

    if team.is_empty() {
        return Err(AppError::BadRequest(
            "None of the selected models are available".to_string(),
        ));
    }

    let system_prompts: Vec<&str> = team
        .nodes
        .iter()
        .filter_map(|node| node.settings.system_prompt.as_deref())
        .collect();
    let prompt_tokens = state
        .pipeline
        .estimator()
        .estimate_prompt(request.prompt.as_deref().unwrap_or_default(), system_prompts);
    let completion_tokens = request
        .completion_tokens
        .unwrap_or(u64::from(DEFAULT_MAX_TOKENS));
    let estimate = estimate_team_cost(&team, prompt_tokens, completion_tokens);

    info!(
        team_id = %team.id,
        strategy = %team.strategy,
        estimated_cost = estimate.total,
        "Team built"
    );

    Ok(Json(TeamResponse { team, estimate }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(default)]
    pub task_type: TaskType,
    #[serde(default)]
    pub user_tier: AccessTier,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendResponse {
    pub recommendation: TeamRecommendation,
    /// Preview of the recommended team; not stored
    pub team: OrchestrationTeam,
}

/// POST /v1/teams/recommend
pub async fn recommend_team(
    State(state): State<Arc<AppState>>,
    Json(request): Json<RecommendRequest>,
) -> AppResult<Json<RecommendResponse>> {
    let catalog = state.catalog.get_models(&CancellationToken::new()).await?;
    let recommendation =
        state
            .recommender
            .get_recommended_team(request.task_type, &catalog, request.user_tier);

    let team = TeamAssembler::build_team(
        &catalog,
        &recommendation.configs,
        &format!("Recommended {} team", request.task_type),
    );

    Ok(Json(RecommendResponse {
        recommendation,
        team,
    }))
}
