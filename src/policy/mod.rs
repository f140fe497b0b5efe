//! Governance policy
//!
//! All static tables the governance components read: tier configs,
//! classification rules, premium limits, cost tier bands, usage thresholds,
//! the substitution table and task preferences. A policy is built once at
//! startup (either the built-in snapshot or a JSON file) and shared read-only
//! behind an `Arc`, so no locking is needed to read it.

mod defaults;

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    teams::recommend::{TaskPreference, TaskType},
    tiers::{
        AccessTier, Classification, ClassificationRule, CostTier, ModelCostTier,
        PremiumModelLimit, TierConfig,
    },
    usage::governor::{Substitution, UsageThreshold},
};

/// Complete set of governance tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub tiers: Vec<TierConfig>,
    /// Order-significant: the first matching rule wins
    pub classification_rules: Vec<ClassificationRule>,
    /// Applied to identifiers no rule matches
    pub default_classification: Classification,
    pub premium_limits: Vec<PremiumModelLimit>,
    pub cost_tiers: Vec<ModelCostTier>,
    /// Ascending by percent
    pub usage_thresholds: Vec<UsageThreshold>,
    /// Order-significant: the first fragment contained in the model id wins
    pub substitutions: Vec<Substitution>,
    pub task_preferences: Vec<TaskPreference>,
}

impl Default for Policy {
    fn default() -> Self {
        defaults::builtin()
    }
}

impl Policy {
    /// Parse a policy from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid policy JSON")
    }

    /// Load a policy from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        Self::from_json(&text)
    }

    /// Load the policy file if configured, otherwise the built-in snapshot.
    ///
    /// Configuration defects are logged, not fatal.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let policy = match path {
            Some(path) => {
                info!(path = %path, "Loading governance policy from file");
                Self::from_path(path)?
            }
            None => {
                info!("Using built-in governance policy");
                Self::default()
            }
        };

        for defect in policy.validate() {
            warn!(defect = %defect, "Governance policy defect");
        }

        Ok(policy)
    }

    pub fn tier_config(&self, tier: AccessTier) -> Option<&TierConfig> {
        self.tiers.iter().find(|config| config.tier == tier)
    }

    /// First premium limit whose pattern matches the model id
    pub fn premium_limit_for(&self, model_id: &str) -> Option<&PremiumModelLimit> {
        self.premium_limits.iter().find(|limit| limit.matches(model_id))
    }

    pub fn cost_tier_info(&self, tier: CostTier) -> Option<&ModelCostTier> {
        self.cost_tiers.iter().find(|info| info.tier == tier)
    }

    /// Highest threshold the usage has reached
    pub fn threshold_for(&self, usage_percent: f64) -> Option<&UsageThreshold> {
        self.usage_thresholds
            .iter()
            .filter(|threshold| usage_percent >= threshold.percent)
            .last()
    }

    /// Substitution alternative for a model id
    pub fn substitution_for(&self, model_id: &str) -> Option<&str> {
        self.substitutions
            .iter()
            .find(|substitution| substitution.matches(model_id))
            .map(|substitution| substitution.alternative.as_str())
    }

    /// Preferred model ids for a task, falling back to the general list
    pub fn preferred_models(&self, task: TaskType) -> &[String] {
        self.task_preferences
            .iter()
            .find(|preference| preference.task == task)
            .or_else(|| {
                self.task_preferences
                    .iter()
                    .find(|preference| preference.task == TaskType::General)
            })
            .map(|preference| preference.models.as_slice())
            .unwrap_or(&[])
    }

    /// Report configuration defects.
    ///
    /// A defect never fails a request at runtime; it only degrades the
    /// quality of decisions (for example a missing alternative).
    pub fn validate(&self) -> Vec<String> {
        let mut defects = Vec::new();

        for tier in AccessTier::HIERARCHY {
            match self.tier_config(tier) {
                None => defects.push(format!("No tier config for {}", tier)),
                Some(config) if config.max_models_in_team == 0 => {
                    defects.push(format!("Tier {} allows zero models per team", tier))
                }
                Some(_) => {}
            }
        }

        for tier in CostTier::ALL {
            match self.cost_tier_info(tier) {
                None => defects.push(format!("No cost tier entry for {}", tier)),
                Some(info) if info.representative_models.is_empty() => {
                    defects.push(format!("Cost tier {} has no representative models", tier))
                }
                Some(_) => {}
            }
        }

        for pair in self.usage_thresholds.windows(2) {
            if pair[1].percent <= pair[0].percent {
                defects.push(format!(
                    "Usage thresholds not ascending: {} then {}",
                    pair[0].percent, pair[1].percent
                ));
            }
        }

        let mut restricted_to: Option<&Vec<CostTier>> = None;
        for threshold in &self.usage_thresholds {
            let Some(tiers) = threshold.restrict_to.as_ref() else {
                continue;
            };
            if let Some(earlier) = restricted_to {
                for tier in tiers.iter().filter(|tier| !earlier.contains(tier)) {
                    defects.push(format!(
                        "Usage threshold at {}% re-allows {} models restricted earlier",
                        threshold.percent, tier
                    ));
                }
            }
            restricted_to = Some(tiers);
        }

        for rule in &self.classification_rules {
            if rule.cost_tier < CostTier::Premium {
                continue;
            }
            for pattern in &rule.patterns {
                if self.substitution_for(pattern).is_none() {
                    defects.push(format!(
                        "No substitution entry for {} model pattern '{}'",
                        rule.cost_tier, pattern
                    ));
                }
            }
        }

        defects
    }
}
