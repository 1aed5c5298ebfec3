//! App Core for historysync.
//!
//! `SyncApp` owns the collaborators of one poll-normalize-select-submit cycle
//! and drives them either once or on a fixed interval.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::managers::sync_state_manager::{SyncStateManager, SyncStateManagerTrait};
use crate::services::history_reader::{HistorySource, SafariHistoryStore};
use crate::services::incremental_selector::IncrementalSelector;
use crate::services::normalizer;
use crate::services::sync_client::SyncClient;
use crate::types::errors::{CycleError, SyncError};
use crate::types::settings::SyncSettings;
use crate::types::sync::{CycleReport, SyncState};

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// The history poller.
pub struct SyncApp<S: HistorySource> {
    pub source: S,
    pub selector: IncrementalSelector,
    pub client: SyncClient,
    pub state_manager: SyncStateManager,
    pub poll_interval: Duration,
}

impl SyncApp<SafariHistoryStore> {
    /// Wires the poller against the Safari store named in `settings`.
    pub fn from_settings(settings: &SyncSettings) -> Result<Self, SyncError> {
        let client = SyncClient::new(
            settings.endpoint.clone(),
            Duration::from_secs(settings.request_timeout_secs),
        )?;
        Ok(Self::new(
            SafariHistoryStore::new(settings.history_db.clone()),
            IncrementalSelector::new(Duration::from_secs(settings.window_secs)),
            client,
            SyncStateManager::new(settings.state_path.clone()),
            Duration::from_secs(settings.poll_interval_secs),
        ))
    }
}

impl<S: HistorySource> SyncApp<S> {
    pub fn new(
        source: S,
        selector: IncrementalSelector,
        client: SyncClient,
        state_manager: SyncStateManager,
        poll_interval: Duration,
    ) -> Self {
        Self {
            source,
            selector,
            client,
            state_manager,
            poll_interval,
        }
    }

    /// Runs one cycle against `state` at time `now_millis`.
    ///
    /// Returns the state to carry into the next cycle. On error the caller
    /// keeps its previous state, so a failed first run stays a first run.
    pub async fn run_cycle_at(
        &self,
        state: &SyncState,
        now_millis: i64,
    ) -> Result<(SyncState, CycleReport), CycleError> {
        let first_run = state.is_first_run();
        let events = normalizer::normalize_source(&self.source)?;
        let normalized = events.len();
        let selected = self.selector.select(events, first_run, now_millis);

        let inserted = if selected.is_empty() {
            info!(first_run, normalized, "no new items to submit");
            None
        } else {
            let response = self.client.submit(&selected).await?;
            Some(response.inserted)
        };

        let report = CycleReport {
            first_run,
            normalized,
            selected: selected.len(),
            inserted,
        };
        let next = SyncState {
            bootstrapped: true,
            last_success_at: Some(now_millis),
            last_inserted: inserted.or(state.last_inserted),
        };
        Ok((next, report))
    }

    /// Loads the persisted state, runs one cycle now and saves the result.
    pub async fn run_once(&self) -> Result<CycleReport, CycleError> {
        let state = self.state_manager.load()?;
        let (next, report) = self.run_cycle_at(&state, now_millis()).await?;
        self.state_manager.save(&next)?;
        info!(
            first_run = report.first_run,
            normalized = report.normalized,
            selected = report.selected,
            inserted = ?report.inserted,
            "sync cycle complete"
        );
        Ok(report)
    }

    /// Runs a cycle immediately and then once per poll interval until
    /// `shutdown` resolves. Cycles are awaited in turn and never overlap; a
    /// failed cycle is logged and the loop carries on.
    pub async fn run<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(interval_secs = self.poll_interval.as_secs(), "history poller started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    warn!("shutdown requested; stopping poller");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "sync cycle failed");
                    }
                }
            }
        }
    }
}
