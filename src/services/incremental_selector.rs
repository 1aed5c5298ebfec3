//! Incremental Selector.
//!
//! Decides which normalized events a cycle submits: everything on the first
//! run, otherwise only visits inside a trailing window ending at `now`.
//!
//! The window is a local heuristic. It never consults the ingest store, so a
//! cycle that runs later than one window after the previous successful one
//! leaves the visits in between unsent.

use std::time::Duration;

use crate::types::event::Event;

/// Window used when none is configured.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IncrementalSelector {
    window: Duration,
}

impl IncrementalSelector {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Oldest `visited_at` a non-first cycle still sends.
    pub fn cutoff(&self, now_millis: i64) -> i64 {
        now_millis.saturating_sub(self.window.as_millis() as i64)
    }

    /// Returns the events to submit, preserving their order.
    pub fn select(&self, events: Vec<Event>, first_run: bool, now_millis: i64) -> Vec<Event> {
        if first_run {
            return events;
        }
        let cutoff = self.cutoff(now_millis);
        events
            .into_iter()
            .filter(|e| e.visited_at >= cutoff)
            .collect()
    }
}

impl Default for IncrementalSelector {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
