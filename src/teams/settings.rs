//! Generation settings
//!
//! Merge rule, stated once: a per-model value overrides the request-level
//! value, which overrides the defaults below.

use serde::{Deserialize, Serialize};

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 4_096;
pub const MAX_TEMPERATURE: f32 = 2.0;

/// Optional per-model overrides chosen by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

impl ModelSettings {
    /// Values set here win, unset ones come from `base`
    pub fn merged_over(&self, base: &ModelSettings) -> ModelSettings {
        ModelSettings {
            temperature: self.temperature.or(base.temperature),
            max_tokens: self.max_tokens.or(base.max_tokens),
            system_prompt: self
                .system_prompt
                .clone()
                .or_else(|| base.system_prompt.clone()),
        }
    }

    /// Fill the remaining gaps with defaults
    pub fn resolve(&self) -> ResolvedSettings {
        ResolvedSettings {
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            system_prompt: self.system_prompt.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(temperature) = self.temperature {
            validate_temperature(temperature)?;
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Fully resolved settings for one model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedSettings {
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

/// Optional orchestration features requested by the user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggles {
    #[serde(default)]
    pub reasoning: bool,
    #[serde(default)]
    pub web_search: bool,
    #[serde(default)]
    pub cross_validation: bool,
}

/// Request-level settings sent with every inference call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationSettings {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub features: FeatureToggles,
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    DEFAULT_MAX_TOKENS
}

impl Default for OrchestrationSettings {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            features: FeatureToggles::default(),
        }
    }
}

impl OrchestrationSettings {
    /// Request-level values as the base layer for per-model merging
    pub fn as_model_settings(&self) -> ModelSettings {
        ModelSettings {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            system_prompt: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_temperature(self.temperature)?;
        if self.max_tokens == 0 {
            return Err("max_tokens must be greater than zero".to_string());
        }
        Ok(())
    }
}

fn validate_temperature(temperature: f32) -> Result<(), String> {
    if !(0.0..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(format!(
            "temperature must be between 0 and {}, got {}",
            MAX_TEMPERATURE, temperature
        ));
    }
    Ok(())
}
