//! Event store for the ingest service.
//!
//! Implements `EventStoreTrait`: the high-water-mark dedup insert and the
//! unfiltered read-back, backed by SQLite via `rusqlite`.

use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::types::errors::StorageError;
use crate::types::event::{Event, StoredEvent};

const SELECT_COLUMNS: &str =
    "SELECT seq, id, url, visitedAt, nextVisitedAt, title, datetime, duration FROM history";

/// Result of one dedup insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOutcome {
    pub inserted: u64,
    /// The high-water-mark row read before inserting.
    pub latest_item: Option<StoredEvent>,
}

/// Trait defining ingest store operations.
pub trait EventStoreTrait {
    fn insert_batch(&mut self, events: &[Event]) -> Result<InsertOutcome, StorageError>;
    fn latest(&self) -> Result<Option<StoredEvent>, StorageError>;
    fn list_all(&self) -> Result<Vec<StoredEvent>, StorageError>;
    fn count(&self) -> Result<u64, StorageError>;
}

/// Event store backed by a SQLite connection.
pub struct EventStore<'a> {
    conn: &'a Connection,
}

impl<'a> EventStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn row_to_stored(row: &rusqlite::Row) -> rusqlite::Result<StoredEvent> {
        Ok(StoredEvent {
            seq: row.get(0)?,
            id: row.get(1)?,
            url: row.get(2)?,
            visited_at: row.get(3)?,
            next_visited_at: row.get(4)?,
            title: row.get(5)?,
            datetime: row.get(6)?,
            duration: row.get(7)?,
        })
    }

    fn query_latest(conn: &Connection) -> rusqlite::Result<Option<StoredEvent>> {
        conn.query_row(
            &format!("{SELECT_COLUMNS} ORDER BY visitedAt DESC, seq DESC LIMIT 1"),
            [],
            Self::row_to_stored,
        )
        .optional()
    }

    fn validate(events: &[Event]) -> Result<(), StorageError> {
        match events.iter().position(|e| e.url.is_empty()) {
            Some(index) => Err(StorageError::InvalidBatch(format!(
                "event {} has an empty url",
                index
            ))),
            None => Ok(()),
        }
    }
}

impl<'a> EventStoreTrait for EventStore<'a> {
    /// Appends the events newer than the stored high-water mark.
    ///
    /// The mark read, the filter and the inserts share one IMMEDIATE
    /// transaction, so concurrent writers serialize on the database lock and a
    /// failure leaves no partial batch behind. `(url, visitedAt)` is unique;
    /// repeats inside a batch are ignored and not counted.
    fn insert_batch(&mut self, events: &[Event]) -> Result<InsertOutcome, StorageError> {
        Self::validate(events)?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let latest_item = Self::query_latest(&tx)?;
        let mark = latest_item.as_ref().map(|item| item.visited_at);

        let mut inserted = 0u64;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO history \
                 (id, url, visitedAt, nextVisitedAt, title, datetime, duration) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for event in events
                .iter()
                .filter(|e| mark.map_or(true, |m| e.visited_at > m))
            {
                inserted += stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    event.url,
                    event.visited_at,
                    event.next_visited_at,
                    event.title,
                    event.datetime,
                    event.duration,
                ])? as u64;
            }
        }
        tx.commit()?;

        debug!(received = events.len(), inserted, mark = ?mark, "batch applied");
        Ok(InsertOutcome {
            inserted,
            latest_item,
        })
    }

    /// Returns the row with the greatest `visitedAt`, if any.
    fn latest(&self) -> Result<Option<StoredEvent>, StorageError> {
        Ok(Self::query_latest(self.conn)?)
    }

    /// Returns every stored row ordered by `visitedAt`, oldest first.
    fn list_all(&self) -> Result<Vec<StoredEvent>, StorageError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY visitedAt ASC, seq ASC"))?;
        let rows = stmt.query_map([], Self::row_to_stored)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM history", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
