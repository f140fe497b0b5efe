//! Backend API data models
//!
//! Data structures for the remote inference backend's requests and responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::teams::{
    settings::{OrchestrationSettings, ResolvedSettings},
    Strategy,
};

/// Model pricing in USD per 1M tokens
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    #[serde(rename = "promptPer1M", default, skip_serializing_if = "Option::is_none")]
    pub prompt_per_1m: Option<f64>,
    #[serde(rename = "completionPer1M", default, skip_serializing_if = "Option::is_none")]
    pub completion_per_1m: Option<f64>,
}

impl ModelPricing {
    pub fn new(prompt_per_1m: f64, completion_per_1m: f64) -> Self {
        Self {
            prompt_per_1m: Some(prompt_per_1m),
            completion_per_1m: Some(completion_per_1m),
        }
    }
}

/// Catalog entry for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub provider: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pricing: Option<ModelPricing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_window: Option<u32>,
}

/// Response from the models endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelsResponse {
    pub data: Vec<ModelInfo>,
}

/// A single "run inference" call.
///
/// Targets either explicit model ids or a team id, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceRequest {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<Strategy>,
    pub settings: OrchestrationSettings,
    /// Fully merged settings per model id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub model_settings: BTreeMap<String, ResolvedSettings>,
    #[serde(default)]
    pub stream: bool,
}

impl InferenceRequest {
    pub fn for_models(
        prompt: impl Into<String>,
        model_ids: Vec<String>,
        settings: OrchestrationSettings,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model_ids: Some(model_ids),
            team_id: None,
            strategy: None,
            settings,
            model_settings: BTreeMap::new(),
            stream: false,
        }
    }

    pub fn for_team(
        prompt: impl Into<String>,
        team_id: impl Into<String>,
        settings: OrchestrationSettings,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model_ids: None,
            team_id: Some(team_id.into()),
            strategy: None,
            settings,
            model_settings: BTreeMap::new(),
            stream: false,
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_model_settings(mut self, model_settings: BTreeMap<String, ResolvedSettings>) -> Self {
        self.model_settings = model_settings;
        self
    }

    pub fn streaming(mut self) -> Self {
        self.stream = true;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".to_string());
        }
        match (&self.model_ids, &self.team_id) {
            (Some(ids), None) if ids.is_empty() => {
                return Err("model_ids must not be empty".to_string())
            }
            (Some(_), None) | (None, Some(_)) => {}
            (Some(_), Some(_)) => {
                return Err("specify either model_ids or team_id, not both".to_string())
            }
            (None, None) => return Err("either model_ids or team_id is required".to_string()),
        }
        self.settings.validate()
    }
}

/// Output of one model in a team run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelOutput {
    pub model_id: String,
    pub content: String,
}

/// Token usage reported by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Complete (non-streamed) inference payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceResponse {
    pub content: String,
    #[serde(default)]
    pub model_outputs: Vec<ModelOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<TokenUsage>,
}

/// One server-sent event payload of a streamed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamChunk {
    pub text: String,
}
