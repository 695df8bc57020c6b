//! JSON persistence for scope state and settings.

use crate::error::StoreError;
use crate::settings::{ScopeSettings, SettingsStore, UserSettings};
use crate::types::ScopeSnapshot;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

/// Data version for schema migrations.
const DATA_VERSION: u32 = 1;

/// Everything persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedState {
    /// Schema version for migrations.
    pub version: u32,
    #[serde(default)]
    pub scopes: HashMap<String, ScopeSnapshot>,
    #[serde(default)]
    pub scope_settings: HashMap<String, ScopeSettings>,
    #[serde(default)]
    pub user_settings: HashMap<String, UserSettings>,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: DATA_VERSION,
            scopes: HashMap::new(),
            scope_settings: HashMap::new(),
            user_settings: HashMap::new(),
        }
    }
}

/// State file writer.
///
/// Keeps the last snapshot of every scope so that saving one scope writes
/// the state of all of them. Callers save while holding their own scope
/// lock; the file itself is guarded by an internal mutex.
pub struct StateFile {
    path: Option<PathBuf>,
    scopes: Mutex<HashMap<String, ScopeSnapshot>>,
}

impl StateFile {
    /// Open the state file, returning it with whatever it already holds.
    ///
    /// A missing file yields empty state.
    pub async fn open(path: impl Into<PathBuf>) -> Result<(Self, PersistedState), StoreError> {
        let path = path.into();
        let state = load(&path).await?;

        let file = Self {
            path: Some(path),
            scopes: Mutex::new(state.scopes.clone()),
        };

        Ok((file, state))
    }

    /// In-memory only (no persistence).
    pub fn memory() -> Self {
        Self {
            path: None,
            scopes: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    /// Record a scope's snapshot and write all state to disk.
    #[instrument(skip(self, snapshot, settings))]
    pub async fn save(
        &self,
        scope_id: &str,
        snapshot: ScopeSnapshot,
        settings: &SettingsStore,
    ) -> Result<(), StoreError> {
        let mut scopes = self.scopes.lock().await;
        scopes.insert(scope_id.to_string(), snapshot);

        let Some(path) = &self.path else {
            return Ok(());
        };

        let (scope_settings, user_settings) = settings.snapshot().await;
        let state = PersistedState {
            version: DATA_VERSION,
            scopes: scopes.clone(),
            scope_settings,
            user_settings,
        };
        let data = serde_json::to_vec_pretty(&state)?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Atomic write
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, path).await?;

        debug!("Saved state ({} bytes) to {:?}", data.len(), path);
        Ok(())
    }
}

async fn load(path: &Path) -> Result<PersistedState, StoreError> {
    if !fs::try_exists(path).await? {
        info!("State file not found at {:?}, starting fresh", path);
        return Ok(PersistedState::default());
    }

    let data = fs::read(path).await?;
    let state: PersistedState = serde_json::from_slice(&data)?;

    if state.version != DATA_VERSION {
        return Err(StoreError::UnsupportedVersion(state.version));
    }

    info!(
        "Loaded state: {} scopes, {} scope settings, {} user settings",
        state.scopes.len(),
        state.scope_settings.len(),
        state.user_settings.len()
    );

    Ok(state)
}
