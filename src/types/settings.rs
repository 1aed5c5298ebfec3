use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::platform;

/// Settings for the history poller.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncSettings {
    /// Base URL of the ingest service, e.g. `https://history.example.workers.dev`.
    pub endpoint: Option<String>,
    pub history_db: PathBuf,
    pub state_path: PathBuf,
    pub poll_interval_secs: u64,
    /// How far back a non-first cycle looks for new visits.
    pub window_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            history_db: platform::get_safari_dir().join("History.db"),
            state_path: platform::get_data_dir().join("sync-state.json"),
            poll_interval_secs: 60 * 60,
            window_secs: 60 * 60,
            request_timeout_secs: 60,
        }
    }
}
