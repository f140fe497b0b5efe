//! Team data types

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::backend::models::ModelPricing;

use super::settings::ModelSettings;

/// Role of a model within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelRole {
    Primary,
    Validator,
    Specialist,
    Fallback,
}

impl ModelRole {
    /// Sort key for execution order
    pub fn priority(self) -> u8 {
        match self {
            ModelRole::Primary => 0,
            ModelRole::Validator => 1,
            ModelRole::Specialist => 2,
            ModelRole::Fallback => 3,
        }
    }
}

impl Default for ModelRole {
    fn default() -> Self {
        ModelRole::Primary
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelRole::Primary => "primary",
            ModelRole::Validator => "validator",
            ModelRole::Specialist => "specialist",
            ModelRole::Fallback => "fallback",
        };
        f.write_str(name)
    }
}

/// Coordination topology for combining team outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Sequential,
    Parallel,
    Cascade,
    Ensemble,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Sequential
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
            Strategy::Cascade => "cascade",
            Strategy::Ensemble => "ensemble",
        };
        f.write_str(name)
    }
}

/// A model the user selected, with its role and overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedModelConfig {
    pub model_id: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub role: ModelRole,
    #[serde(default)]
    pub settings: ModelSettings,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn enabled_by_default() -> bool {
    true
}

impl SelectedModelConfig {
    pub fn new(model_id: impl Into<String>, role: ModelRole) -> Self {
        Self {
            model_id: model_id.into(),
            enabled: true,
            role,
            settings: ModelSettings::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_settings(mut self, settings: ModelSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

/// One model in an execution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNode {
    pub model_id: String,
    pub name: String,
    pub provider: String,
    pub role: ModelRole,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelPricing>,
    #[serde(default)]
    pub settings: ModelSettings,
    pub enabled: bool,
}

/// An ordered, role-tagged execution plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationTeam {
    pub id: String,
    pub name: String,
    pub nodes: Vec<TeamNode>,
    pub strategy: Strategy,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrchestrationTeam {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn model_ids(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.model_id.clone()).collect()
    }
}

/// Cost of one node
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeCost {
    pub model_id: String,
    pub role: ModelRole,
    pub prompt_cost: f64,
    pub completion_cost: f64,
    pub total: f64,
}

/// Estimated USD cost of running a team once
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEstimate {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub breakdown: Vec<NodeCost>,
    pub total: f64,
}
