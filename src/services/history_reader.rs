//! Read-only access to a browser's SQLite data store.
//!
//! [`StoreReader`] exposes the two operations the rest of the crate needs
//! from a local store: list its tables and select every row of one table.
//! [`SafariHistoryStore`] builds [`RawHistory`] on top of that for the
//! `history_items` / `history_visits` pair.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::{Map, Number, Value};
use tracing::{debug, warn};

use crate::types::errors::SourceError;
use crate::types::event::{RawHistory, RawItem, RawVisit};

/// A row as a JSON object keyed by column name.
pub type Row = Map<String, Value>;

/// Anything that can produce the raw visit and item sets for one poll.
pub trait HistorySource {
    fn load(&self) -> Result<RawHistory, SourceError>;
}

/// Read-only handle on a SQLite file.
pub struct StoreReader {
    path: PathBuf,
    conn: Connection,
}

impl StoreReader {
    /// Opens `path` read-only. The file is never created or written.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| unavailable(&path, e))?;
        Ok(Self { path, conn })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists user tables. A file that is not a database fails here.
    pub fn list_tables(&self) -> Result<Vec<String>, SourceError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .map_err(|e| unavailable(&self.path, e))?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(|e| unavailable(&self.path, e))?;

        let mut tables = Vec::new();
        for name in names {
            tables.push(name.map_err(|e| SourceError::Query(e.to_string()))?);
        }
        Ok(tables)
    }

    /// Selects every row of `table`, in rowid order where the table has one.
    pub fn select_all(&self, table: &str) -> Result<Vec<Row>, SourceError> {
        let sql = format!("SELECT * FROM \"{}\"", table.replace('"', "\"\""));
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| SourceError::Query(format!("{}: {}", table, e)))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut rows = stmt
            .query([])
            .map_err(|e| SourceError::Query(format!("{}: {}", table, e)))?;
        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| SourceError::Query(format!("{}: {}", table, e)))?
        {
            let mut obj = Map::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let value = row
                    .get_ref(i)
                    .map_err(|e| SourceError::Query(e.to_string()))?;
                obj.insert(column.clone(), value_to_json(value));
            }
            out.push(obj);
        }
        Ok(out)
    }

    /// Dumps every table as `{ table: [row, ...] }`.
    pub fn dump(&self) -> Result<Map<String, Value>, SourceError> {
        let mut data = Map::new();
        for table in self.list_tables()? {
            let rows = self.select_all(&table)?;
            data.insert(table, Value::Array(rows.into_iter().map(Value::Object).collect()));
        }
        Ok(data)
    }
}

fn unavailable(path: &Path, e: rusqlite::Error) -> SourceError {
    SourceError::Unavailable {
        path: path.display().to_string(),
        reason: e.to_string(),
    }
}

fn value_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        ValueRef::Text(t) => Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::String(BASE64.encode(b)),
    }
}

/// Safari's `History.db`.
pub struct SafariHistoryStore {
    path: PathBuf,
}

impl SafariHistoryStore {
    pub const ITEMS_TABLE: &'static str = "history_items";
    pub const VISITS_TABLE: &'static str = "history_visits";

    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistorySource for SafariHistoryStore {
    /// Opens the store, reads both tables and closes it again.
    ///
    /// A missing table reads as empty; rows without a usable id, url, item
    /// reference or timestamp are skipped.
    fn load(&self) -> Result<RawHistory, SourceError> {
        let reader = StoreReader::open(&self.path)?;
        let tables = reader.list_tables()?;

        let read = |table: &str| -> Result<Vec<Row>, SourceError> {
            if tables.iter().any(|t| t == table) {
                reader.select_all(table)
            } else {
                warn!(table, path = %self.path.display(), "table missing from history store");
                Ok(Vec::new())
            }
        };

        let item_rows = read(Self::ITEMS_TABLE)?;
        let visit_rows = read(Self::VISITS_TABLE)?;

        let items: Vec<RawItem> = item_rows.iter().filter_map(item_from_row).collect();
        let visits: Vec<RawVisit> = visit_rows.iter().filter_map(visit_from_row).collect();

        let skipped = (item_rows.len() - items.len()) + (visit_rows.len() - visits.len());
        debug!(items = items.len(), visits = visits.len(), skipped, "history store read");

        Ok(RawHistory { items, visits })
    }
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(Value::as_str).map(str::to_string)
}

fn item_from_row(row: &Row) -> Option<RawItem> {
    let id = row.get("id")?.as_i64()?;
    let url = text(row, "url").filter(|u| !u.is_empty())?;
    Some(RawItem {
        id,
        url,
        title: text(row, "title"),
    })
}

fn visit_from_row(row: &Row) -> Option<RawVisit> {
    Some(RawVisit {
        history_item: row.get("history_item")?.as_i64()?,
        visit_time: row.get("visit_time")?.as_f64()?,
        title: text(row, "title"),
    })
}
