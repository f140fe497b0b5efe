//! Usage module
//!
//! Usage-driven throttling of expensive models.

pub mod governor;

pub use governor::{
    AccessDecision, DenialKind, Substitution, ThresholdAction, UsageGovernor, UsageThreshold,
};
