//! Subscription-based model access control

use std::sync::Arc;

use crate::policy::Policy;

use super::{classifier::ModelClassifier, config::AccessTier};

/// Binary access decision over the tier hierarchy
#[derive(Debug, Clone)]
pub struct AccessController {
    classifier: ModelClassifier,
}

impl AccessController {
    pub fn new(policy: Arc<Policy>) -> Self {
        Self {
            classifier: ModelClassifier::new(policy),
        }
    }

    pub fn classifier(&self) -> &ModelClassifier {
        &self.classifier
    }

    /// True iff the user's tier is at or above the tier the model requires
    pub fn can_access(&self, user_tier: AccessTier, model_id: &str) -> bool {
        let required = self.classifier.required_access_tier(model_id);
        user_tier.level() >= required.level()
    }
}
