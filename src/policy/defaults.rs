//! Built-in policy snapshot
//!
//! Prices and caps are a point-in-time snapshot; deployments override them
//! with a policy file (`QUORUM_POLICY_PATH`).

use crate::{
    teams::recommend::{TaskPreference, TaskType},
    tiers::{
        AccessTier, Classification, ClassificationRule, CostTier, ModelCostTier,
        PremiumModelLimit, TierConfig, TierFeatures,
    },
    usage::governor::{Substitution, ThresholdAction, UsageThreshold},
};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub(super) fn builtin() -> super::Policy {
    super::Policy {
        tiers: tiers(),
        classification_rules: classification_rules(),
        default_classification: Classification {
            cost_tier: CostTier::Standard,
            access_tier: AccessTier::Starter,
        },
        premium_limits: premium_limits(),
        cost_tiers: cost_tiers(),
        usage_thresholds: usage_thresholds(),
        substitutions: substitutions(),
        task_preferences: task_preferences(),
    }
}

fn tiers() -> Vec<TierConfig> {
    vec![
        TierConfig {
            tier: AccessTier::Free,
            display_name: "Free".to_string(),
            max_models_in_team: 1,
            max_concurrent_requests: 1,
            monthly_quota: Some(50),
            features: TierFeatures::default(),
        },
        TierConfig {
            tier: AccessTier::Starter,
            display_name: "Starter".to_string(),
            max_models_in_team: 3,
            max_concurrent_requests: 2,
            monthly_quota: Some(500),
            features: TierFeatures {
                can_use_teams: true,
                custom_prompts: true,
                ..TierFeatures::default()
            },
        },
        TierConfig {
            tier: AccessTier::Pro,
            display_name: "Pro".to_string(),
            max_models_in_team: 5,
            max_concurrent_requests: 5,
            monthly_quota: Some(2_000),
            features: TierFeatures {
                can_use_teams: true,
                advanced_reasoning: true,
                premium_models: true,
                custom_prompts: true,
                export: true,
                priority_support: false,
            },
        },
        TierConfig {
            tier: AccessTier::Enterprise,
            display_name: "Enterprise".to_string(),
            max_models_in_team: 10,
            max_concurrent_requests: 20,
            monthly_quota: None,
            features: TierFeatures {
                can_use_teams: true,
                advanced_reasoning: true,
                premium_models: true,
                custom_prompts: true,
                export: true,
                priority_support: true,
            },
        },
    ]
}

fn classification_rules() -> Vec<ClassificationRule> {
    vec![
        ClassificationRule {
            cost_tier: CostTier::Flagship,
            access_tier: AccessTier::Enterprise,
            patterns: strings(&[
                "gpt-5.2-pro",
                "o3-pro",
                "o1-pro",
                "claude-opus",
                "gemini-3-pro",
                "grok-4-heavy",
                "gpt-4.5",
            ]),
        },
        ClassificationRule {
            cost_tier: CostTier::Premium,
            access_tier: AccessTier::Pro,
            patterns: strings(&[
                "gpt-5.2",
                "gpt-5.1",
                "claude-sonnet-4",
                "claude-3.7-sonnet",
                "gemini-2.5-pro",
                "grok-4",
                "mistral-large",
            ]),
        },
        ClassificationRule {
            cost_tier: CostTier::Standard,
            access_tier: AccessTier::Starter,
            patterns: strings(&[
                "gpt-5-mini",
                "gpt-4.1",
                "claude-haiku-4",
                "gemini-2.5-flash",
                "mistral-medium",
                "deepseek-r1",
                "grok-3",
                "o4-mini",
                "llama-3.1-405b",
                "qwen3-max",
            ]),
        },
        ClassificationRule {
            cost_tier: CostTier::Budget,
            access_tier: AccessTier::Free,
            patterns: strings(&[
                "gpt-4o-mini",
                "gpt-5-nano",
                "gemini-2.0-flash",
                "claude-3-haiku",
                "llama-3",
                "mistral-small",
                "deepseek-chat",
                "deepseek-v3",
                "qwen",
                "gemma",
                "phi-",
            ]),
        },
    ]
}

fn premium_limits() -> Vec<PremiumModelLimit> {
    let limit = |pattern: &str, daily: u64, monthly: u64, price: f64, tier: AccessTier| {
        PremiumModelLimit {
            pattern: pattern.to_string(),
            daily_token_limit: daily,
            monthly_token_limit: monthly,
            price_per_1m_tokens: price,
            required_tier: tier,
        }
    };

    // Flagship entries first: "gpt-5.2" would otherwise shadow "gpt-5.2-pro"
    vec![
        limit("gpt-5.2-pro", 50_000, 1_000_000, 120.0, AccessTier::Enterprise),
        limit("o3-pro", 50_000, 1_000_000, 80.0, AccessTier::Enterprise),
        limit("o1-pro", 25_000, 500_000, 150.0, AccessTier::Enterprise),
        limit("claude-opus", 100_000, 2_000_000, 75.0, AccessTier::Enterprise),
        limit("gemini-3-pro", 100_000, 2_000_000, 12.0, AccessTier::Enterprise),
        limit("grok-4-heavy", 50_000, 1_000_000, 60.0, AccessTier::Enterprise),
        limit("gpt-4.5", 25_000, 500_000, 150.0, AccessTier::Enterprise),
        limit("gpt-5.2", 200_000, 5_000_000, 14.0, AccessTier::Pro),
        limit("claude-sonnet-4", 250_000, 5_000_000, 15.0, AccessTier::Pro),
        limit("gemini-2.5-pro", 250_000, 5_000_000, 10.0, AccessTier::Pro),
        limit("grok-4", 200_000, 4_000_000, 15.0, AccessTier::Pro),
    ]
}

fn cost_tiers() -> Vec<ModelCostTier> {
    vec![
        ModelCostTier {
            tier: CostTier::Budget,
            min_price_per_1m: 0.0,
            max_price_per_1m: Some(1.0),
            representative_models: strings(&[
                "openai/gpt-4o-mini",
                "google/gemini-2.0-flash",
                "meta-llama/llama-3.1-8b",
            ]),
        },
        ModelCostTier {
            tier: CostTier::Standard,
            min_price_per_1m: 1.0,
            max_price_per_1m: Some(5.0),
            representative_models: strings(&[
                "openai/gpt-5-mini",
                "anthropic/claude-haiku-4.5",
                "google/gemini-2.5-flash",
            ]),
        },
        ModelCostTier {
            tier: CostTier::Premium,
            min_price_per_1m: 5.0,
            max_price_per_1m: Some(20.0),
            representative_models: strings(&[
                "openai/gpt-5.2",
                "anthropic/claude-sonnet-4.5",
                "google/gemini-2.5-pro",
            ]),
        },
        ModelCostTier {
            tier: CostTier::Flagship,
            min_price_per_1m: 20.0,
            max_price_per_1m: None,
            representative_models: strings(&[
                "openai/gpt-5.2-pro",
                "anthropic/claude-opus-4.5",
                "google/gemini-3-pro",
            ]),
        },
    ]
}

fn usage_thresholds() -> Vec<UsageThreshold> {
    vec![
        UsageThreshold {
            percent: 50.0,
            action: ThresholdAction::Warning,
            message: "Half of your monthly quota is used. Flagship models pause beyond this point."
                .to_string(),
            restrict_to: Some(vec![CostTier::Budget, CostTier::Standard, CostTier::Premium]),
            strictly_above: true,
        },
        UsageThreshold {
            percent: 75.0,
            action: ThresholdAction::Throttle,
            message: "75% of your monthly quota is used. Premium and flagship models are paused."
                .to_string(),
            restrict_to: Some(vec![CostTier::Budget, CostTier::Standard]),
            strictly_above: false,
        },
        UsageThreshold {
            percent: 90.0,
            action: ThresholdAction::Throttle,
            message: "90% of your monthly quota is used. Only budget models remain available."
                .to_string(),
            restrict_to: Some(vec![CostTier::Budget]),
            strictly_above: false,
        },
        UsageThreshold {
            percent: 100.0,
            action: ThresholdAction::Block,
            message: "Your monthly quota is exhausted. Paid requests are blocked until it resets."
                .to_string(),
            restrict_to: Some(vec![CostTier::Budget]),
            strictly_above: false,
        },
    ]
}

fn substitutions() -> Vec<Substitution> {
    let sub = |fragment: &str, alternative: &str| Substitution {
        fragment: fragment.to_string(),
        alternative: alternative.to_string(),
    };

    // Flagship fragments first, they contain premium fragments
    vec![
        sub("gpt-5.2-pro", "openai/gpt-5-mini"),
        sub("o3-pro", "openai/o4-mini"),
        sub("o1-pro", "openai/o4-mini"),
        sub("claude-opus", "anthropic/claude-haiku-4.5"),
        sub("gemini-3-pro", "google/gemini-2.5-flash"),
        sub("grok-4-heavy", "x-ai/grok-3-mini"),
        sub("gpt-4.5", "openai/gpt-4.1"),
        sub("gpt-5.2", "openai/gpt-5-mini"),
        sub("gpt-5.1", "openai/gpt-5-mini"),
        sub("claude-sonnet-4", "anthropic/claude-haiku-4.5"),
        sub("claude-3.7-sonnet", "anthropic/claude-haiku-4.5"),
        sub("gemini-2.5-pro", "google/gemini-2.5-flash"),
        sub("grok-4", "x-ai/grok-3-mini"),
        sub("mistral-large", "mistralai/mistral-medium-3"),
    ]
}

fn task_preferences() -> Vec<TaskPreference> {
    let pref = |task: TaskType, models: &[&str]| TaskPreference {
        task,
        models: strings(models),
    };

    vec![
        pref(
            TaskType::Coding,
            &[
                "anthropic/claude-sonnet-4.5",
                "openai/gpt-5.2",
                "openai/gpt-5-mini",
                "deepseek/deepseek-r1",
                "anthropic/claude-haiku-4.5",
                "openai/gpt-4o-mini",
            ],
        ),
        pref(
            TaskType::Writing,
            &[
                "anthropic/claude-opus-4.5",
                "anthropic/claude-sonnet-4.5",
                "openai/gpt-5-mini",
                "google/gemini-2.5-flash",
                "openai/gpt-4o-mini",
            ],
        ),
        pref(
            TaskType::Analysis,
            &[
                "openai/gpt-5.2-pro",
                "google/gemini-2.5-pro",
                "openai/gpt-5.2",
                "anthropic/claude-haiku-4.5",
                "google/gemini-2.0-flash",
            ],
        ),
        pref(
            TaskType::Research,
            &[
                "google/gemini-3-pro",
                "google/gemini-2.5-pro",
                "openai/gpt-5-mini",
                "deepseek/deepseek-chat",
                "google/gemini-2.0-flash",
            ],
        ),
        pref(
            TaskType::Creative,
            &[
                "anthropic/claude-opus-4.5",
                "openai/gpt-5.2",
                "x-ai/grok-3-mini",
                "meta-llama/llama-3.1-8b",
            ],
        ),
        pref(
            TaskType::General,
            &[
                "openai/gpt-5-mini",
                "anthropic/claude-haiku-4.5",
                "google/gemini-2.5-flash",
                "openai/gpt-4o-mini",
                "meta-llama/llama-3.1-8b",
            ],
        ),
    ]
}
