//! Usage governor
//!
//! Narrows the usable cost tiers as quota usage grows and decides whether a
//! model may be used right now. Usage percentage is an input on every call;
//! the governor keeps no counters of its own and is safe to share.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    policy::Policy,
    tiers::{AccessController, AccessTier, CostTier, ModelClassifier},
};

/// What happens once a usage threshold is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdAction {
    Warning,
    Throttle,
    Block,
}

/// A usage boundary with the message shown once it is reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageThreshold {
    pub percent: f64,
    pub action: ThresholdAction,
    pub message: String,
    /// Cost tiers that remain usable, `None` for no restriction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrict_to: Option<Vec<CostTier>>,
    /// The restriction starts strictly above `percent` instead of at it.
    /// The action and message always apply from `percent` on.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strictly_above: bool,
}

impl UsageThreshold {
    /// Whether `restrict_to` applies at this usage
    pub fn restricts_at(&self, usage_percent: f64) -> bool {
        if self.strictly_above {
            usage_percent > self.percent
        } else {
            usage_percent >= self.percent
        }
    }
}

/// Cheaper alternative for models whose id contains `fragment`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub fragment: String,
    pub alternative: String,
}

impl Substitution {
    pub fn matches(&self, model_id: &str) -> bool {
        model_id
            .to_lowercase()
            .contains(self.fragment.to_lowercase().as_str())
    }
}

/// Why a model was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    /// The subscription tier is below the model's required tier
    Subscription,
    /// Usage has narrowed the allowed cost tiers
    Usage,
}

/// Structured access decision; denial is a value, not an error
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessDecision {
    pub allowed: bool,
    pub cost_tier: CostTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialKind>,
    /// Action of the highest usage threshold reached, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ThresholdAction>,
}

impl AccessDecision {
    fn allow(cost_tier: CostTier, action: Option<ThresholdAction>) -> Self {
        Self {
            allowed: true,
            cost_tier,
            reason: None,
            alternative: None,
            denial: None,
            action,
        }
    }

    fn deny(
        cost_tier: CostTier,
        denial: DenialKind,
        reason: String,
        alternative: Option<String>,
        action: Option<ThresholdAction>,
    ) -> Self {
        Self {
            allowed: false,
            cost_tier,
            reason: Some(reason),
            alternative,
            denial: Some(denial),
            action,
        }
    }
}

/// Stateless usage-based admission control
#[derive(Debug, Clone)]
pub struct UsageGovernor {
    access: AccessController,
}

impl UsageGovernor {
    pub fn new(policy: Arc<Policy>) -> Self {
        Self {
            access: AccessController::new(policy),
        }
    }

    fn classifier(&self) -> &ModelClassifier {
        self.access.classifier()
    }

    fn policy(&self) -> &Policy {
        self.classifier().policy()
    }

    pub fn access(&self) -> &AccessController {
        &self.access
    }

    /// Cost tiers usable at the given usage, cheapest first.
    ///
    /// Every threshold whose restriction applies narrows the set, so the set
    /// never grows as usage grows. With the built-in policy: `>= 90` budget
    /// only, `>= 75` budget and standard, `> 50` everything but flagship,
    /// otherwise all four.
    pub fn allowed_cost_tiers(&self, usage_percent: f64) -> Vec<CostTier> {
        let mut allowed = CostTier::ALL.to_vec();
        for threshold in &self.policy().usage_thresholds {
            if let Some(tiers) = threshold
                .restrict_to
                .as_ref()
                .filter(|_| threshold.restricts_at(usage_percent))
            {
                allowed.retain(|tier| tiers.contains(tier));
            }
        }
        allowed
    }

    /// Whether a `block` threshold has been reached and paid calls must halt
    pub fn should_block(&self, usage_percent: f64) -> bool {
        self.policy()
            .threshold_for(usage_percent)
            .is_some_and(|threshold| threshold.action == ThresholdAction::Block)
    }

    /// Decide whether `model_id` may be used right now by a `user_tier` user.
    ///
    /// Subscription access is checked first, then the usage restriction.
    pub fn can_use_model_with_usage(
        &self,
        model_id: &str,
        usage_percent: f64,
        user_tier: AccessTier,
    ) -> AccessDecision {
        let classification = self.classifier().classification(model_id);
        let action = self
            .policy()
            .threshold_for(usage_percent)
            .map(|threshold| threshold.action);
        let allowed_tiers = self.allowed_cost_tiers(usage_percent);

        if !self.access.can_access(user_tier, model_id) {
            let reason = format!(
                "{} requires the {} plan or higher (current plan: {})",
                model_id, classification.access_tier, user_tier
            );
            let alternative = self
                .policy()
                .substitution_for(model_id)
                .filter(|alternative| {
                    self.access.can_access(user_tier, alternative)
                        && allowed_tiers.contains(&self.classifier().classify(alternative))
                })
                .map(str::to_string);

            debug!(
                model = %model_id,
                user_tier = %user_tier,
                required_tier = %classification.access_tier,
                alternative = ?alternative,
                "Model denied by subscription tier"
            );
            metrics::counter!("quorum_access_denials_total", "kind" => "subscription").increment(1);

            return AccessDecision::deny(
                classification.cost_tier,
                DenialKind::Subscription,
                reason,
                alternative,
                action,
            );
        }

        if allowed_tiers.contains(&classification.cost_tier) {
            return AccessDecision::allow(classification.cost_tier, action);
        }

        let reason = format!(
            "Usage is at {:.1}% of your monthly quota; {} models are paused until usage resets",
            usage_percent, classification.cost_tier
        );
        let alternative = self.suggest_alternative(model_id, &allowed_tiers, user_tier);

        debug!(
            model = %model_id,
            usage_percent,
            cost_tier = %classification.cost_tier,
            alternative = ?alternative,
            "Model throttled by usage"
        );
        metrics::counter!("quorum_access_denials_total", "kind" => "usage").increment(1);

        AccessDecision::deny(
            classification.cost_tier,
            DenialKind::Usage,
            reason,
            alternative,
            action,
        )
    }

    /// Substitution-table alternative, stepped down to the cheapest allowed
    /// tier's representative when the table entry is itself not allowed
    fn suggest_alternative(
        &self,
        model_id: &str,
        allowed_tiers: &[CostTier],
        user_tier: AccessTier,
    ) -> Option<String> {
        let Some(alternative) = self.policy().substitution_for(model_id) else {
            warn!(model = %model_id, "No substitution entry configured for restricted model");
            return None;
        };

        if allowed_tiers.contains(&self.classifier().classify(alternative))
            && self.access.can_access(user_tier, alternative)
        {
            return Some(alternative.to_string());
        }

        let cheapest = allowed_tiers.iter().min()?;
        self.policy()
            .cost_tier_info(*cheapest)
            .and_then(|info| {
                info.representative_models
                    .iter()
                    .find(|candidate| self.access.can_access(user_tier, candidate))
            })
            .cloned()
    }
}
