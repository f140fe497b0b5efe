//! Orchestration pipeline
//!
//! One request flows through: catalog lookup, subscription and usage
//! governance (with substitution), team assembly, cost estimation, the usage
//! block check and finally the resilient backend call.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::{
    backend::{InferenceBackend, InferenceRequest, InferenceResponse, ModelInfo, TextStream},
    catalog::CatalogCache,
    error::{AppError, AppResult},
    policy::Policy,
    resilience::{InvokeError, ResilientInvoker, RetryInfo, RetryObserver},
    routes::metrics::record_invocation,
    teams::{
        estimate_team_cost, CostEstimate, OrchestrationSettings, OrchestrationTeam,
        SelectedModelConfig, TeamAssembler,
    },
    tiers::AccessTier,
    tokens::TokenEstimator,
    usage::{DenialKind, ThresholdAction, UsageGovernor},
};

const DEFAULT_TEAM_NAME: &str = "Custom team";

/// A user's orchestration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationRequest {
    pub prompt: String,
    pub selections: Vec<SelectedModelConfig>,
    #[serde(default)]
    pub user_tier: AccessTier,
    /// Share of the monthly quota already used, 0..=100 and beyond
    #[serde(default)]
    pub usage_percent: f64,
    #[serde(default)]
    pub settings: OrchestrationSettings,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub stream: bool,
}

impl OrchestrationRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.prompt.trim().is_empty() {
            return Err("prompt must not be empty".to_string());
        }
        if self.selections.is_empty() {
            return Err("at least one model must be selected".to_string());
        }
        if !self.usage_percent.is_finite() || self.usage_percent < 0.0 {
            return Err(format!(
                "usage_percent must be a non-negative number, got {}",
                self.usage_percent
            ));
        }
        self.settings.validate()?;
        for selection in &self.selections {
            selection
                .settings
                .validate()
                .map_err(|e| format!("{}: {}", selection.model_id, e))?;
        }
        Ok(())
    }
}

/// Why a selection changed or disappeared on its way into the team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Denied by subscription tier, no usable alternative
    AccessDenied,
    /// Denied by usage, no usable alternative
    Throttled,
    /// Replaced by its alternative
    Substituted,
    /// Not present in the model catalog
    Unresolved,
    /// Same model already in the team
    Duplicate,
    /// Beyond the tier's team size
    TeamLimit,
}

/// User-facing record of a governance change
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub model_id: String,
    pub kind: NoticeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternative: Option<String>,
}

impl Notice {
    fn new(model_id: &str, kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            model_id: model_id.to_string(),
            kind,
            message: message.into(),
            alternative: None,
        }
    }
}

/// Selections after governance
#[derive(Debug, Clone, Default)]
pub struct Governed {
    pub configs: Vec<SelectedModelConfig>,
    pub notices: Vec<Notice>,
}

/// The highest usage threshold reached
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStatus {
    pub usage_percent: f64,
    pub action: ThresholdAction,
    pub message: String,
}

impl UsageStatus {
    pub fn for_usage(policy: &Policy, usage_percent: f64) -> Option<Self> {
        policy.threshold_for(usage_percent).map(|threshold| Self {
            usage_percent,
            action: threshold.action,
            message: threshold.message.clone(),
        })
    }
}

/// Everything decided before the backend is called
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedRun {
    pub team: OrchestrationTeam,
    pub estimate: CostEstimate,
    pub notices: Vec<Notice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageStatus>,
    #[serde(skip)]
    pub inference: InferenceRequest,
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub response: InferenceResponse,
    pub retry: RetryInfo,
    #[serde(flatten)]
    pub prepared: PreparedRun,
}

/// A streamed run; errors after the stream opened arrive as stream items
pub struct PipelineStream {
    pub prepared: PreparedRun,
    pub retry: RetryInfo,
    pub stream: TextStream,
}

/// Governance and resilience around one backend
pub struct Pipeline {
    policy: Arc<Policy>,
    governor: UsageGovernor,
    assembler: TeamAssembler,
    catalog: Arc<CatalogCache>,
    backend: Arc<dyn InferenceBackend>,
    invoker: ResilientInvoker,
    estimator: TokenEstimator,
}

impl Pipeline {
    pub fn new(
        policy: Arc<Policy>,
        assembler: TeamAssembler,
        catalog: Arc<CatalogCache>,
        backend: Arc<dyn InferenceBackend>,
        invoker: ResilientInvoker,
        estimator: TokenEstimator,
    ) -> Self {
        Self {
            governor: UsageGovernor::new(Arc::clone(&policy)),
            policy,
            assembler,
            catalog,
            backend,
            invoker,
            estimator,
        }
    }

    pub fn governor(&self) -> &UsageGovernor {
        &self.governor
    }

    pub fn assembler(&self) -> &TeamAssembler {
        &self.assembler
    }

    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    pub fn estimator(&self) -> &TokenEstimator {
        &self.estimator
    }

    /// Apply subscription and usage governance to the enabled selections.
    ///
    /// A denied model is replaced by its alternative when the alternative is
    /// in the catalog, otherwise dropped. Every change yields a notice. The
    /// result is cut to the tier's team size.
    pub fn govern(
        &self,
        selections: &[SelectedModelConfig],
        catalog: &[ModelInfo],
        user_tier: AccessTier,
        usage_percent: f64,
    ) -> Governed {
        let in_catalog = |id: &str| catalog.iter().any(|model| model.id == id);
        let mut governed = Governed::default();
        let mut seen: HashSet<String> = HashSet::new();

        for selection in selections.iter().filter(|s| s.enabled) {
            let id = selection.model_id.as_str();
            if !in_catalog(id) {
                governed.notices.push(Notice::new(
                    id,
                    NoticeKind::Unresolved,
                    format!("{} is not available", id),
                ));
                continue;
            }

            let decision = self
                .governor
                .can_use_model_with_usage(id, usage_percent, user_tier);

            let config = if decision.allowed {
                selection.clone()
            } else {
                let reason = decision.reason.unwrap_or_default();
                match decision.alternative.filter(|alt| in_catalog(alt.as_str())) {
                    Some(alternative) => {
                        debug!(model = %id, alternative = %alternative, "Substituting model");
                        governed.notices.push(Notice {
                            alternative: Some(alternative.clone()),
                            ..Notice::new(id, NoticeKind::Substituted, reason)
                        });
                        SelectedModelConfig {
                            model_id: alternative,
                            ..selection.clone()
                        }
                    }
                    None => {
                        let kind = match decision.denial {
                            Some(DenialKind::Usage) => NoticeKind::Throttled,
                            _ => NoticeKind::AccessDenied,
                        };
                        governed.notices.push(Notice::new(id, kind, reason));
                        continue;
                    }
                }
            };

            if !seen.insert(config.model_id.clone()) {
                governed.notices.push(Notice::new(
                    &config.model_id,
                    NoticeKind::Duplicate,
                    format!("{} is already in the team", config.model_id),
                ));
                continue;
            }
            governed.configs.push(config);
        }

        let max_models = self
            .policy
            .tier_config(user_tier)
            .map(|config| config.max_models_in_team)
            .unwrap_or(1);
        governed.configs.sort_by_key(|config| config.role.priority());
        if governed.configs.len() > max_models {
            for dropped in governed.configs.split_off(max_models) {
                governed.notices.push(Notice::new(
                    &dropped.model_id,
                    NoticeKind::TeamLimit,
                    format!(
                        "The {} plan allows {} model(s) per team",
                        user_tier, max_models
                    ),
                ));
            }
        }

        governed
    }

    /// Everything up to, but not including, the backend call
    #[instrument(skip(self, request, cancel), fields(tier = %request.user_tier, usage = request.usage_percent))]
    pub async fn prepare(
        &self,
        request: &OrchestrationRequest,
        cancel: &CancellationToken,
    ) -> AppResult<PreparedRun> {
        request.validate().map_err(AppError::BadRequest)?;

        let catalog = self.catalog.get_models(cancel).await?;
        let governed = self.govern(
            &request.selections,
            &catalog,
            request.user_tier,
            request.usage_percent,
        );

        let name = request.team_name.as_deref().unwrap_or(DEFAULT_TEAM_NAME);
        let team = self.assembler.assemble(&catalog, &governed.configs, name);

        let base = request.settings.as_model_settings();
        let model_settings: BTreeMap<_, _> = team
            .nodes
            .iter()
            .map(|node| (node.model_id.clone(), node.settings.merged_over(&base).resolve()))
            .collect();

        let prompt_tokens = self.estimator.estimate_prompt(
            &request.prompt,
            model_settings
                .values()
                .filter_map(|settings| settings.system_prompt.as_deref()),
        );
        let estimate =
            estimate_team_cost(&team, prompt_tokens, u64::from(request.settings.max_tokens));

        let usage = UsageStatus::for_usage(&self.policy, request.usage_percent);

        if self.governor.should_block(request.usage_percent) {
            info!(usage = request.usage_percent, "Usage quota reached, refusing to invoke");
            metrics::counter!("quorum_usage_blocks_total").increment(1);
            let message = usage
                .as_ref()
                .map(|status| status.message.clone())
                .unwrap_or_else(|| "Monthly usage quota reached".to_string());
            return Err(AppError::UsageBlocked {
                message,
                usage_percent: request.usage_percent,
            });
        }

        if team.is_empty() {
            let denied = governed.notices.iter().any(|notice| {
                matches!(notice.kind, NoticeKind::AccessDenied | NoticeKind::Throttled)
            });
            let reasons: Vec<&str> = governed
                .notices
                .iter()
                .map(|notice| notice.message.as_str())
                .collect();
            let message = format!("No selected model can be used: {}", reasons.join("; "));
            warn!(notices = governed.notices.len(), "Governance left an empty team");
            return Err(if denied {
                AppError::AccessDenied(message)
            } else {
                AppError::BadRequest(message)
            });
        }

        let inference = InferenceRequest::for_models(
            request.prompt.clone(),
            team.model_ids(),
            request.settings.clone(),
        )
        .with_strategy(team.strategy)
        .with_model_settings(model_settings);

        Ok(PreparedRun {
            team,
            estimate,
            notices: governed.notices,
            usage,
            inference,
        })
    }

    /// Run the full pipeline and wait for the complete response
    pub async fn run(
        &self,
        request: &OrchestrationRequest,
        cancel: &CancellationToken,
        observer: Option<&dyn RetryObserver>,
    ) -> AppResult<PipelineOutcome> {
        let prepared = self.prepare(request, cancel).await?;
        let strategy = prepared.team.strategy.to_string();

        let started = Instant::now();
        let backend = Arc::clone(&self.backend);
        let inference = &prepared.inference;
        let outcome = self
            .invoker
            .execute(|| backend.run_inference(inference), cancel, observer)
            .await;
        record_invocation(outcome_label(&outcome), &strategy, started.elapsed().as_secs_f64());

        let invoked = outcome?;
        info!(
            team_id = %prepared.team.id,
            strategy = %strategy,
            retries = invoked.retry.attempts,
            estimated_cost = prepared.estimate.total,
            "Orchestration completed"
        );

        Ok(PipelineOutcome {
            response: invoked.result,
            retry: invoked.retry,
            prepared,
        })
    }

    /// Run the full pipeline and stream the response text.
    ///
    /// Retries cover opening the stream; once text flows it is not retried.
    pub async fn run_stream(
        &self,
        request: &OrchestrationRequest,
        cancel: &CancellationToken,
        observer: Option<&dyn RetryObserver>,
    ) -> AppResult<PipelineStream> {
        let prepared = self.prepare(request, cancel).await?;
        let strategy = prepared.team.strategy.to_string();

        let started = Instant::now();
        let backend = Arc::clone(&self.backend);
        let inference = &prepared.inference;
        let outcome = self
            .invoker
            .execute(|| backend.run_inference_stream(inference), cancel, observer)
            .await;
        record_invocation(outcome_label(&outcome), &strategy, started.elapsed().as_secs_f64());

        let invoked = outcome?;
        Ok(PipelineStream {
            prepared,
            retry: invoked.retry,
            stream: invoked.result,
        })
    }
}

fn outcome_label<T>(outcome: &Result<T, InvokeError>) -> &'static str {
    match outcome {
        Ok(_) => "success",
        Err(err) if err.is_cancelled() => "cancelled",
        Err(_) => "failure",
    }
}
