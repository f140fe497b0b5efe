//! Model classification
//!
//! Maps an opaque model identifier to a cost tier and a required access tier.
//!
//! Evaluation contract: the identifier is lower-cased, then the policy's
//! classification rules are tested in the order they are declared. The first
//! rule with a pattern that is a substring of the identifier wins. The built-in
//! policy declares flagship/enterprise first, then premium/pro, then
//! standard/starter, then budget/free. Identifiers matching no rule get the
//! policy's default classification (standard/starter), never free.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::policy::Policy;

use super::{config::AccessTier, limits::PremiumModelLimit};

/// Price band of a model
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Budget,
    Standard,
    Premium,
    Flagship,
}

impl CostTier {
    /// All cost tiers, cheapest first
    pub const ALL: [CostTier; 4] = [
        CostTier::Budget,
        CostTier::Standard,
        CostTier::Premium,
        CostTier::Flagship,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CostTier::Budget => "budget",
            CostTier::Standard => "standard",
            CostTier::Premium => "premium",
            CostTier::Flagship => "flagship",
        }
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cost tier and required access tier resolved for one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub cost_tier: CostTier,
    pub access_tier: AccessTier,
}

/// One ordered classification rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationRule {
    pub cost_tier: CostTier,
    pub access_tier: AccessTier,
    /// Substring patterns, compared case-insensitively
    pub patterns: Vec<String>,
}

impl ClassificationRule {
    /// Whether any pattern is a substring of the already lower-cased id
    fn matches(&self, lowered_id: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| lowered_id.contains(pattern.to_lowercase().as_str()))
    }

    pub fn classification(&self) -> Classification {
        Classification {
            cost_tier: self.cost_tier,
            access_tier: self.access_tier,
        }
    }
}

/// Everything the UI needs to badge a model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelProfile {
    pub model_id: String,
    pub cost_tier: CostTier,
    pub required_tier: AccessTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub premium_limit: Option<PremiumModelLimit>,
}

/// Pure, deterministic model classifier over a shared policy
#[derive(Debug, Clone)]
pub struct ModelClassifier {
    policy: Arc<Policy>,
}

impl ModelClassifier {
    pub fn new(policy: Arc<Policy>) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &Arc<Policy> {
        &self.policy
    }

    /// Resolve both tiers for a model id
    pub fn classification(&self, model_id: &str) -> Classification {
        let lowered = model_id.to_lowercase();

        self.policy
            .classification_rules
            .iter()
            .find(|rule| rule.matches(&lowered))
            .map(ClassificationRule::classification)
            .unwrap_or(self.policy.default_classification)
    }

    pub fn classify(&self, model_id: &str) -> CostTier {
        self.classification(model_id).cost_tier
    }

    pub fn required_access_tier(&self, model_id: &str) -> AccessTier {
        self.classification(model_id).access_tier
    }

    pub fn profile(&self, model_id: &str) -> ModelProfile {
        let classification = self.classification(model_id);
        ModelProfile {
            model_id: model_id.to_string(),
            cost_tier: classification.cost_tier,
            required_tier: classification.access_tier,
            premium_limit: self.policy.premium_limit_for(model_id).cloned(),
        }
    }
}
