//! Team repository
//!
//! Assembled teams are kept in an explicit store handed to the assembler,
//! keyed by the fingerprint of the selection that produced them. The
//! in-memory store is bounded and evicts the oldest team first.

use std::collections::{HashMap, VecDeque};
use std::sync::RwLock;

use tracing::debug;

use super::types::OrchestrationTeam;

/// Teams kept by [`InMemoryTeamStore::new`]
pub const DEFAULT_TEAM_CAPACITY: usize = 256;

/// Storage for assembled teams and the currently active one
pub trait TeamStore: Send + Sync {
    /// Team built from the selection with this fingerprint
    fn get(&self, fingerprint: &str) -> Option<OrchestrationTeam>;

    fn put(&self, fingerprint: &str, team: OrchestrationTeam);

    /// Mark a stored team as active; false if no such team
    fn set_active(&self, team_id: &str) -> bool;

    fn active(&self) -> Option<OrchestrationTeam>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Teardown: drop every team and the active marker
    fn clear(&self);
}

#[derive(Default)]
struct Teams {
    by_fingerprint: HashMap<String, OrchestrationTeam>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
}

/// In-memory team store
///
/// Uses RwLock for interior mutability, allowing concurrent reads.
pub struct InMemoryTeamStore {
    teams: RwLock<Teams>,
    active: RwLock<Option<String>>,
    capacity: usize,
}

impl Default for InMemoryTeamStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTeamStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TEAM_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            teams: RwLock::new(Teams::default()),
            active: RwLock::new(None),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl TeamStore for InMemoryTeamStore {
    fn get(&self, fingerprint: &str) -> Option<OrchestrationTeam> {
        let teams = self.teams.read().unwrap_or_else(|e| e.into_inner());
        teams.by_fingerprint.get(fingerprint).cloned()
    }

    fn put(&self, fingerprint: &str, team: OrchestrationTeam) {
        let mut evicted = Vec::new();
        {
            let mut teams = self.teams.write().unwrap_or_else(|e| e.into_inner());
            debug!(team_id = %team.id, nodes = team.nodes.len(), "Storing team");
            if teams
                .by_fingerprint
                .insert(fingerprint.to_string(), team)
                .is_none()
            {
                teams.order.push_back(fingerprint.to_string());
            }

            while teams.order.len() > self.capacity {
                let Some(oldest) = teams.order.pop_front() else {
                    break;
                };
                if let Some(team) = teams.by_fingerprint.remove(&oldest) {
                    debug!(team_id = %team.id, "Evicting oldest team");
                    evicted.push(team.id);
                }
            }
        }

        if !evicted.is_empty() {
            let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
            if active.as_ref().is_some_and(|id| evicted.contains(id)) {
                *active = None;
            }
        }
    }

    fn set_active(&self, team_id: &str) -> bool {
        let known = {
            let teams = self.teams.read().unwrap_or_else(|e| e.into_inner());
            teams.by_fingerprint.values().any(|team| team.id == team_id)
        };
        if known {
            let mut active = self.active.write().unwrap_or_else(|e| e.into_inner());
            *active = Some(team_id.to_string());
        }
        known
    }

    fn active(&self) -> Option<OrchestrationTeam> {
        let active = self.active.read().unwrap_or_else(|e| e.into_inner());
        let id = active.as_deref()?;
        let teams = self.teams.read().unwrap_or_else(|e| e.into_inner());
        teams
            .by_fingerprint
            .values()
            .find(|team| team.id == id)
            .cloned()
    }

    fn len(&self) -> usize {
        self.teams
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .by_fingerprint
            .len()
    }

    fn clear(&self) {
        {
            let mut teams = self.teams.write().unwrap_or_else(|e| e.into_inner());
            teams.by_fingerprint.clear();
            teams.order.clear();
        }
        *self.active.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
