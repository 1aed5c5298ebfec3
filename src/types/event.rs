use serde::{Deserialize, Serialize};

/// A row from Safari's `history_items` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    pub id: i64,
    pub url: String,
    pub title: Option<String>,
}

/// A row from Safari's `history_visits` table.
///
/// `visit_time` is seconds since the platform epoch (2001-01-01T00:00:00Z).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawVisit {
    pub history_item: i64,
    pub visit_time: f64,
    pub title: Option<String>,
}

/// Everything read from the local store in one poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHistory {
    pub items: Vec<RawItem>,
    pub visits: Vec<RawVisit>,
}

/// A normalized browsing event, as sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub url: String,
    /// Milliseconds since the Unix epoch.
    pub visited_at: i64,
    pub title: String,
    /// ISO-8601 rendering of `visited_at`.
    pub datetime: String,
    pub next_visited_at: Option<i64>,
    /// Seconds until the next visit, capped at 300.
    pub duration: Option<i64>,
}

/// An event persisted by the ingest service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    /// Autoincrement insertion order.
    pub seq: i64,
    /// Generated identity (UUID v4).
    pub id: String,
    pub url: String,
    pub visited_at: i64,
    pub next_visited_at: Option<i64>,
    pub title: String,
    pub datetime: String,
    pub duration: Option<i64>,
}
