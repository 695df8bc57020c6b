//! Process-wide registry of scope state.

use crate::types::{ScopeSnapshot, ScopeState};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

/// Shared handle to one scope's state.
///
/// The mutex is the scope's exclusive lock: hold it for the whole handling
/// of one event.
pub type ScopeHandle = Arc<Mutex<ScopeState>>;

/// Registry of per-scope state.
///
/// The registry has its own lock, distinct from the per-scope locks, so
/// that two events for a brand-new scope always resolve to the same state.
#[derive(Clone, Default)]
pub struct ScopeRegistry {
    scopes: Arc<RwLock<HashMap<String, ScopeHandle>>>,
}

impl ScopeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded from persisted snapshots.
    pub fn from_snapshots(snapshots: HashMap<String, ScopeSnapshot>) -> Self {
        let scopes = snapshots
            .into_iter()
            .map(|(id, snapshot)| {
                let state = ScopeState::from_snapshot(id.clone(), snapshot);
                (id, Arc::new(Mutex::new(state)))
            })
            .collect::<HashMap<_, _>>();

        info!("Scope registry restored ({} scopes)", scopes.len());

        Self {
            scopes: Arc::new(RwLock::new(scopes)),
        }
    }

    /// Get the handle for a scope, creating its state on first use.
    #[instrument(skip(self))]
    pub async fn scope(&self, scope_id: &str) -> ScopeHandle {
        if let Some(handle) = self.scopes.read().await.get(scope_id) {
            return handle.clone();
        }

        let mut scopes = self.scopes.write().await;
        scopes
            .entry(scope_id.to_string())
            .or_insert_with(|| {
                debug!("Created state for scope {}", scope_id);
                Arc::new(Mutex::new(ScopeState::new(scope_id)))
            })
            .clone()
    }

    /// Get the handle for a scope only if it already exists.
    pub async fn get(&self, scope_id: &str) -> Option<ScopeHandle> {
        self.scopes.read().await.get(scope_id).cloned()
    }

    /// Number of known scopes.
    pub async fn scope_count(&self) -> usize {
        self.scopes.read().await.len()
    }
}
