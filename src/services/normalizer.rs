//! Event Normalizer.
//!
//! Turns raw `history_visits` / `history_items` rows into [`Event`]s ordered
//! newest first, with the next-visit time and dwell duration filled in from
//! that order.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::services::history_reader::HistorySource;
use crate::types::errors::SourceError;
use crate::types::event::{Event, RawHistory, RawItem};

/// 2001-01-01T00:00:00Z in Unix milliseconds.
pub const PLATFORM_EPOCH_MILLIS: i64 = 978_307_200_000;

/// Upper bound on the dwell duration, in seconds.
pub const MAX_DWELL_SECS: i64 = 300;

/// Converts seconds since the platform epoch to Unix milliseconds, rounded
/// to the nearest millisecond. Non-finite or out-of-range input yields `None`.
pub fn platform_time_to_unix_millis(secs: f64) -> Option<i64> {
    if !secs.is_finite() {
        return None;
    }
    let millis = (PLATFORM_EPOCH_MILLIS as f64 + secs * 1000.0).round();
    if millis < i64::MIN as f64 || millis >= i64::MAX as f64 {
        return None;
    }
    Some(millis as i64)
}

/// Renders Unix millis as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_datetime(unix_millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(unix_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Seconds from `visited_at` to `next_visited_at`, capped at [`MAX_DWELL_SECS`].
pub fn dwell_secs(visited_at: i64, next_visited_at: i64) -> i64 {
    ((next_visited_at - visited_at) / 1000).min(MAX_DWELL_SECS)
}

/// Builds the full event sequence for one poll.
///
/// Visits pointing at an unknown or url-less item, and visits whose timestamp
/// cannot be converted, are dropped. The result is sorted by `visited_at` descending;
/// the sort is stable so equal timestamps keep their store order.
pub fn normalize(history: &RawHistory) -> Vec<Event> {
    let items: HashMap<i64, &RawItem> = history
        .items
        .iter()
        .filter(|i| !i.url.is_empty())
        .map(|i| (i.id, i))
        .collect();

    let mut events: Vec<Event> = history
        .visits
        .iter()
        .filter_map(|visit| {
            let item = items.get(&visit.history_item)?;
            let visited_at = platform_time_to_unix_millis(visit.visit_time)?;
            let datetime = format_datetime(visited_at)?;
            let title = visit
                .title
                .clone()
                .filter(|t| !t.is_empty())
                .or_else(|| item.title.clone())
                .unwrap_or_default();
            Some(Event {
                url: item.url.clone(),
                visited_at,
                title,
                datetime,
                next_visited_at: None,
                duration: None,
            })
        })
        .collect();

    events.sort_by(|a, b| b.visited_at.cmp(&a.visited_at));
    assign_next_visits(&mut events);
    events
}

/// Fills `next_visited_at` / `duration` on a newest-first sequence.
///
/// Each event's next visit is its predecessor in the slice; the first event
/// (the most recent one) has none.
pub fn assign_next_visits(events: &mut [Event]) {
    let mut next: Option<i64> = None;
    for event in events.iter_mut() {
        event.next_visited_at = next;
        event.duration = next.map(|n| dwell_secs(event.visited_at, n));
        next = Some(event.visited_at);
    }
}

/// Reads `source` and normalizes it. A source failure is returned as-is;
/// no partial sequence is produced.
pub fn normalize_source<S: HistorySource + ?Sized>(source: &S) -> Result<Vec<Event>, SourceError> {
    let history = source.load()?;
    Ok(normalize(&history))
}
