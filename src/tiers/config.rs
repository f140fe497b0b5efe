//! Subscription tier configuration
//!
//! The tier hierarchy and the per-tier quotas and feature flags.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Subscription tier of a user, and the minimum tier a model requires.
///
/// The hierarchy `free < starter < pro < enterprise` is a total order and is
/// the only thing access comparisons look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Free,
    Starter,
    Pro,
    Enterprise,
}

impl AccessTier {
    /// The fixed hierarchy, lowest first
    pub const HIERARCHY: [AccessTier; 4] = [
        AccessTier::Free,
        AccessTier::Starter,
        AccessTier::Pro,
        AccessTier::Enterprise,
    ];

    /// Index of this tier in [`AccessTier::HIERARCHY`]
    pub fn level(self) -> usize {
        match self {
            AccessTier::Free => 0,
            AccessTier::Starter => 1,
            AccessTier::Pro => 2,
            AccessTier::Enterprise => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AccessTier::Free => "free",
            AccessTier::Starter => "starter",
            AccessTier::Pro => "pro",
            AccessTier::Enterprise => "enterprise",
        }
    }
}

impl Default for AccessTier {
    fn default() -> Self {
        AccessTier::Free
    }
}

impl fmt::Display for AccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(AccessTier::Free),
            "starter" => Ok(AccessTier::Starter),
            "pro" => Ok(AccessTier::Pro),
            "enterprise" => Ok(AccessTier::Enterprise),
            other => Err(format!("Unknown subscription tier: {}", other)),
        }
    }
}

/// Feature flags unlocked by a subscription tier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeatures {
    pub can_use_teams: bool,
    pub advanced_reasoning: bool,
    pub premium_models: bool,
    pub custom_prompts: bool,
    pub export: bool,
    pub priority_support: bool,
}

/// Static configuration of one subscription tier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierConfig {
    pub tier: AccessTier,
    pub display_name: String,
    /// Maximum number of models in one team
    pub max_models_in_team: usize,
    pub max_concurrent_requests: u32,
    /// Monthly request quota, `None` means unlimited
    pub monthly_quota: Option<u64>,
    pub features: TierFeatures,
}

impl TierConfig {
    pub fn is_unlimited(&self) -> bool {
        self.monthly_quota.is_none()
    }
}
