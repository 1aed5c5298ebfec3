use serde::{Deserialize, Serialize};

use super::event::StoredEvent;

/// Poller state persisted between cycles and across restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncState {
    /// True once a full-history submission has succeeded.
    #[serde(default)]
    pub bootstrapped: bool,
    /// Wall-clock millis of the last successful cycle.
    #[serde(default)]
    pub last_success_at: Option<i64>,
    /// Rows the ingest service reported for the last submission.
    #[serde(default)]
    pub last_inserted: Option<u64>,
}

impl SyncState {
    pub fn is_first_run(&self) -> bool {
        !self.bootstrapped
    }
}

/// Body of a successful `POST /insert`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResponse {
    pub success: bool,
    pub inserted: u64,
    /// High-water-mark row as it was before the insert.
    pub latest_item: Option<StoredEvent>,
}

/// `POST /insert` reply as read by the sync client.
///
/// Only `success` and `inserted` are interpreted. The high-water-mark row is
/// kept as raw JSON since ingest deployments disagree on its shape.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertReply {
    pub success: bool,
    #[serde(default)]
    pub inserted: u64,
    #[serde(default)]
    pub latest_item: Option<serde_json::Value>,
}

impl InsertReply {
    /// `visitedAt` of the high-water-mark row, when the reply carries one.
    pub fn high_water_mark(&self) -> Option<i64> {
        self.latest_item.as_ref()?.get("visitedAt")?.as_i64()
    }
}

/// Body of any failed ingest request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Outcome of one poll-normalize-select-submit cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub first_run: bool,
    pub normalized: usize,
    pub selected: usize,
    /// `None` when nothing was selected and no request was made.
    pub inserted: Option<u64>,
}
