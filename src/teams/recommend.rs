//! Task-based team recommendation

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    backend::models::ModelInfo,
    policy::Policy,
    tiers::{AccessController, AccessTier},
};

use super::types::{ModelRole, SelectedModelConfig};

/// Kind of work a team is recommended for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Coding,
    Writing,
    Analysis,
    Research,
    Creative,
    General,
}

impl Default for TaskType {
    fn default() -> Self {
        TaskType::General
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskType::Coding => "coding",
            TaskType::Writing => "writing",
            TaskType::Analysis => "analysis",
            TaskType::Research => "research",
            TaskType::Creative => "creative",
            TaskType::General => "general",
        };
        f.write_str(name)
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coding" | "code" => Ok(TaskType::Coding),
            "writing" => Ok(TaskType::Writing),
            "analysis" => Ok(TaskType::Analysis),
            "research" => Ok(TaskType::Research),
            "creative" => Ok(TaskType::Creative),
            "general" => Ok(TaskType::General),
            other => Err(format!("Unknown task type: {}", other)),
        }
    }
}

/// Ordered list of preferred model ids for a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPreference {
    pub task: TaskType,
    pub models: Vec<String>,
}

/// Selections suggested for a task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecommendation {
    pub task_type: TaskType,
    pub configs: Vec<SelectedModelConfig>,
    /// No preferred model was accessible and the primary came from the catalog
    pub forced_primary: bool,
}

impl TeamRecommendation {
    pub fn model_ids(&self) -> Vec<&str> {
        self.configs.iter().map(|c| c.model_id.as_str()).collect()
    }
}

pub struct TeamRecommender {
    policy: Arc<Policy>,
    access: AccessController,
}

impl TeamRecommender {
    pub fn new(policy: Arc<Policy>) -> Self {
        Self {
            access: AccessController::new(Arc::clone(&policy)),
            policy,
        }
    }

    /// Fill the tier's team slots from the task's preferred models.
    ///
    /// Up to half the slots (at least one) go to primaries, then one
    /// validator when the tier can use teams, then one fallback. Every model
    /// is used at most once.
    pub fn get_recommended_team(
        &self,
        task: TaskType,
        available: &[ModelInfo],
        user_tier: AccessTier,
    ) -> TeamRecommendation {
        let tier_config = self.policy.tier_config(user_tier);
        let max_models = tier_config.map(|c| c.max_models_in_team).unwrap_or(1);
        let can_use_teams = tier_config
            .map(|c| c.features.can_use_teams)
            .unwrap_or(false);

        let mut candidates = self
            .policy
            .preferred_models(task)
            .iter()
            .filter(|id| available.iter().any(|model| &model.id == *id))
            .filter(|id| self.access.can_access(user_tier, id))
            .cloned();

        let primary_slots = (max_models / 2).max(1);
        let mut configs: Vec<SelectedModelConfig> = candidates
            .by_ref()
            .take(primary_slots.min(max_models))
            .map(|id| SelectedModelConfig::new(id, ModelRole::Primary))
            .collect();

        if can_use_teams && configs.len() < max_models {
            if let Some(id) = candidates.next() {
                configs.push(SelectedModelConfig::new(id, ModelRole::Validator));
            }
        }

        if configs.len() < max_models {
            if let Some(id) = candidates.next() {
                configs.push(SelectedModelConfig::new(id, ModelRole::Fallback));
            }
        }

        let mut forced_primary = false;
        if configs.is_empty() {
            if let Some(model) = available
                .iter()
                .find(|model| self.access.can_access(user_tier, &model.id))
            {
                debug!(
                    task = %task,
                    tier = %user_tier,
                    model = %model.id,
                    "No preferred model accessible, forcing catalog model as primary"
                );
                configs.push(SelectedModelConfig::new(model.id.clone(), ModelRole::Primary));
                forced_primary = true;
            }
        }

        TeamRecommendation {
            task_type: task,
            configs,
            forced_primary,
        }
    }
}
