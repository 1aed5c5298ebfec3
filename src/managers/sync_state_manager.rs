//! Sync State Manager.
//!
//! Persists the poller's [`SyncState`] as a small JSON file so the
//! first-run decision survives restarts.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::types::errors::StateError;
use crate::types::sync::SyncState;

/// Trait defining sync state persistence.
pub trait SyncStateManagerTrait {
    fn load(&self) -> Result<SyncState, StateError>;
    fn save(&self, state: &SyncState) -> Result<(), StateError>;
    fn reset(&self) -> Result<(), StateError>;
}

/// File-backed sync state.
pub struct SyncStateManager {
    path: PathBuf,
}

impl SyncStateManager {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SyncStateManagerTrait for SyncStateManager {
    /// Reads the state file. A missing file means nothing was synced yet.
    fn load(&self) -> Result<SyncState, StateError> {
        if !self.path.exists() {
            return Ok(SyncState::default());
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| StateError::Io(format!("Failed to read {}: {}", self.path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| StateError::Serialization(format!("Failed to parse state file: {}", e)))
    }

    /// Writes the state through a sibling temp file and a rename.
    fn save(&self, state: &SyncState) -> Result<(), StateError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| StateError::Io(format!("Failed to create state directory: {}", e)))?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| StateError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| StateError::Io(format!("Failed to write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StateError::Io(format!("Failed to replace state file: {}", e)))?;

        debug!(path = %self.path.display(), "sync state saved");
        Ok(())
    }

    /// Deletes the state file so the next cycle is a first run again.
    fn reset(&self) -> Result<(), StateError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StateError::Io(e.to_string())),
        }
    }
}
