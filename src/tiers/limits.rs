//! Premium model caps and cost tier price bands

use serde::{Deserialize, Serialize};

use super::{classifier::CostTier, config::AccessTier};

/// Token caps and pricing for an expensive model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PremiumModelLimit {
    /// Case-insensitive substring pattern
    pub pattern: String,
    pub daily_token_limit: u64,
    pub monthly_token_limit: u64,
    /// USD per 1M tokens
    pub price_per_1m_tokens: f64,
    pub required_tier: AccessTier,
}

impl PremiumModelLimit {
    pub fn matches(&self, model_id: &str) -> bool {
        model_id
            .to_lowercase()
            .contains(self.pattern.to_lowercase().as_str())
    }
}

/// Price band of one cost tier with representative models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelCostTier {
    pub tier: CostTier,
    /// Lower bound, USD per 1M tokens
    pub min_price_per_1m: f64,
    /// Upper bound, `None` for open-ended
    pub max_price_per_1m: Option<f64>,
    pub representative_models: Vec<String>,
}

impl ModelCostTier {
    pub fn contains_price(&self, price_per_1m: f64) -> bool {
        price_per_1m >= self.min_price_per_1m
            && self.max_price_per_1m.map_or(true, |max| price_per_1m < max)
    }
}
