//! Sync Client.
//!
//! Posts a batch of events as one JSON array to `<endpoint>/insert` and
//! reads back the ingest service's verdict. No retries and no batch
//! splitting: a failed submission is reported and the next cycle tries again.

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::info;

use crate::types::errors::SyncError;
use crate::types::event::Event;
use crate::types::sync::InsertReply;

pub struct SyncClient {
    endpoint: Option<String>,
    http: reqwest::Client,
}

impl SyncClient {
    /// Creates a client for `endpoint`. An absent endpoint is accepted here
    /// and reported as [`SyncError::Config`] when a batch is submitted.
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self, SyncError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("historysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { endpoint, http })
    }

    /// The full insert URL, validated.
    pub fn insert_url(&self) -> Result<String, SyncError> {
        let base = self
            .endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| SyncError::Config("ingest endpoint is not set".to_string()))?;

        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(SyncError::Config(format!(
                "invalid endpoint {}: must start with http:// or https://",
                base
            )));
        }
        Ok(format!("{}/insert", base.trim_end_matches('/')))
    }

    /// Submits `events` in a single request.
    pub async fn submit(&self, events: &[Event]) -> Result<InsertReply, SyncError> {
        let url = self.insert_url()?;
        let body = serde_json::to_vec(events).map_err(|e| SyncError::Serialization(e.to_string()))?;
        info!(count = events.len(), bytes = body.len(), "submitting history batch");

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SyncError::Transport(format!(
                "POST {} returned {}: {}",
                url, status, detail
            )));
        }

        let parsed: InsertReply = response
            .json()
            .await
            .map_err(|e| SyncError::Serialization(format!("unreadable insert response: {}", e)))?;
        if !parsed.success {
            return Err(SyncError::Transport(format!("POST {} reported failure", url)));
        }

        info!(
            inserted = parsed.inserted,
            high_water_mark = ?parsed.high_water_mark(),
            "history submitted"
        );
        Ok(parsed)
    }
}
