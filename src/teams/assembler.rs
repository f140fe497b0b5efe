//! Team assembly
//!
//! Turns role-tagged selections into an ordered execution plan and infers the
//! coordination strategy from the role mix.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::backend::models::ModelInfo;

use super::{
    settings::ModelSettings,
    store::{InMemoryTeamStore, TeamStore},
    types::{ModelRole, OrchestrationTeam, SelectedModelConfig, Strategy, TeamNode},
};

/// Builds teams and caches them in a [`TeamStore`]
pub struct TeamAssembler {
    store: Arc<dyn TeamStore>,
}

impl TeamAssembler {
    pub fn new(store: Arc<dyn TeamStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryTeamStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn TeamStore> {
        &self.store
    }

    /// Build a team from the enabled selections that resolve in `models`.
    ///
    /// Nodes are stable-sorted by role priority, so selections with the same
    /// role keep their input order.
    pub fn build_team(
        models: &[ModelInfo],
        configs: &[SelectedModelConfig],
        name: &str,
    ) -> OrchestrationTeam {
        let mut nodes: Vec<TeamNode> = configs
            .iter()
            .filter(|config| config.enabled)
            .filter_map(|config| {
                let model = models.iter().find(|model| model.id == config.model_id);
                if model.is_none() {
                    debug!(model = %config.model_id, "Selected model not in catalog, skipping");
                }
                model.map(|model| TeamNode {
                    model_id: model.id.clone(),
                    name: model.name.clone(),
                    provider: model.provider.clone(),
                    role: config.role,
                    capabilities: model.capabilities.clone(),
                    pricing: model.pricing.clone(),
                    settings: config.settings.clone(),
                    enabled: true,
                })
            })
            .collect();

        nodes.sort_by_key(|node| node.role.priority());
        let strategy = Self::infer_strategy(&nodes);
        let now = Utc::now();

        OrchestrationTeam {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            nodes,
            strategy,
            created_at: now,
            updated_at: now,
        }
    }

    /// First matching rule wins: validator + primary is a cascade, two or more
    /// primaries an ensemble, any specialist runs in parallel, otherwise the
    /// team runs sequentially.
    pub fn infer_strategy(nodes: &[TeamNode]) -> Strategy {
        let count = |role: ModelRole| nodes.iter().filter(|node| node.role == role).count();

        let primaries = count(ModelRole::Primary);
        if count(ModelRole::Validator) >= 1 && primaries >= 1 {
            Strategy::Cascade
        } else if primaries >= 2 {
            Strategy::Ensemble
        } else if count(ModelRole::Specialist) >= 1 {
            Strategy::Parallel
        } else {
            Strategy::Sequential
        }
    }

    /// Build a team, reusing the stored one while the selection, the name and
    /// the catalog entries of the selected models are unchanged.
    pub fn assemble(
        &self,
        models: &[ModelInfo],
        configs: &[SelectedModelConfig],
        name: &str,
    ) -> OrchestrationTeam {
        let key = team_key(models, configs, name);

        if let Some(team) = self.store.get(&key) {
            debug!(team_id = %team.id, "Reusing team for unchanged selection");
            return team;
        }

        let team = Self::build_team(models, configs, name);
        info!(
            team_id = %team.id,
            nodes = team.nodes.len(),
            strategy = %team.strategy,
            "Assembled team"
        );

        if !team.is_empty() {
            self.store.put(&key, team.clone());
        }
        team
    }

    /// Mark a stored team as the store's active team
    pub fn activate(&self, team_id: &str) -> bool {
        self.store.set_active(team_id)
    }

    pub fn active_team(&self) -> Option<OrchestrationTeam> {
        self.store.active()
    }

    /// Drop every stored team
    pub fn teardown(&self) {
        self.store.clear();
    }
}

#[derive(Serialize)]
struct FingerprintEntry<'a> {
    model_id: &'a str,
    role: ModelRole,
    settings: &'a ModelSettings,
}

fn fingerprint_entries(configs: &[SelectedModelConfig]) -> Vec<FingerprintEntry<'_>> {
    configs
        .iter()
        .filter(|config| config.enabled)
        .map(|config| FingerprintEntry {
            model_id: &config.model_id,
            role: config.role,
            settings: &config.settings,
        })
        .collect()
}

/// Deterministic key of the enabled part of a selection
pub fn selection_fingerprint(configs: &[SelectedModelConfig]) -> String {
    serde_json::to_string(&fingerprint_entries(configs)).unwrap_or_default()
}

#[derive(Serialize)]
struct TeamKey<'a> {
    name: &'a str,
    selection: Vec<FingerprintEntry<'a>>,
    /// Catalog entries the selection resolves to; a pricing change is a new key
    resolved: Vec<Option<&'a ModelInfo>>,
}

/// Store key of an assembled team
fn team_key(models: &[ModelInfo], configs: &[SelectedModelConfig], name: &str) -> String {
    let selection = fingerprint_entries(configs);
    let resolved = selection
        .iter()
        .map(|entry| models.iter().find(|model| model.id == entry.model_id))
        .collect();

    serde_json::to_string(&TeamKey {
        name,
        selection,
        resolved,
    })
    .unwrap_or_default()
}
