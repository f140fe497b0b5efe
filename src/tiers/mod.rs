//! Tier module
//!
//! Subscription tiers, model classification and access control.

pub mod access;
pub mod classifier;
pub mod config;
pub mod limits;

pub use access::AccessController;
pub use classifier::{Classification, ClassificationRule, CostTier, ModelClassifier, ModelProfile};
pub use config::{AccessTier, TierConfig, TierFeatures};
pub use limits::{ModelCostTier, PremiumModelLimit};
