//! Team assembly, recommendation and cost estimation

pub mod assembler;
pub mod cost;
pub mod recommend;
pub mod settings;
pub mod store;
pub mod types;

pub use assembler::{selection_fingerprint, TeamAssembler};
pub use cost::estimate_team_cost;
pub use recommend::{TaskPreference, TaskType, TeamRecommendation, TeamRecommender};
pub use settings::{FeatureToggles, ModelSettings, OrchestrationSettings, ResolvedSettings};
pub use store::{InMemoryTeamStore, TeamStore};
pub use types::{
    CostEstimate, ModelRole, NodeCost, OrchestrationTeam, SelectedModelConfig, Strategy, TeamNode,
};
