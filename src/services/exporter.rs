//! One-shot exports for inspecting local browser data.
//!
//! History can be written as a JSON array of events or as CSV. `export_all`
//! runs a list of independent [`ExtractionTask`]s over Safari's data
//! directory; each task reports its own outcome and a failing task never
//! stops the others.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::services::history_reader::StoreReader;
use crate::types::errors::{ExportError, SourceError};
use crate::types::event::Event;
use crate::types::export::{ExtractionReport, ExtractionTask};

pub const CSV_HEADER: &str = "visitedAt,title,url";

/// Quotes a CSV field when it contains a comma, a double quote or a newline.
pub fn csv_escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Renders events as CSV with a `visitedAt,title,url` header.
pub fn render_csv(events: &[Event]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + events.len() * 64);
    out.push_str(CSV_HEADER);
    for event in events {
        out.push('\n');
        out.push_str(&event.visited_at.to_string());
        out.push(',');
        out.push_str(&csv_escape(&event.title));
        out.push(',');
        out.push_str(&csv_escape(&event.url));
    }
    out.push('\n');
    out
}

pub fn write_csv(path: &Path, events: &[Event]) -> Result<(), ExportError> {
    ensure_parent(path)?;
    fs::write(path, render_csv(events))
        .map_err(|e| ExportError::Io(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), rows = events.len(), "csv written");
    Ok(())
}

/// Writes any serializable value as pretty-printed JSON.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    ensure_parent(path)?;
    let json =
        serde_json::to_string_pretty(value).map_err(|e| ExportError::Serialization(e.to_string()))?;
    fs::write(path, json).map_err(|e| ExportError::Io(format!("{}: {}", path.display(), e)))?;
    info!(path = %path.display(), "json written");
    Ok(())
}

fn ensure_parent(path: &Path) -> Result<(), ExportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .map_err(|e| ExportError::Io(format!("{}: {}", parent.display(), e))),
        _ => Ok(()),
    }
}

/// The SQLite stores and directories Safari keeps under `safari_dir`.
pub fn default_tasks(safari_dir: &Path) -> Vec<ExtractionTask> {
    let sqlite = |name: &str, file: &str| ExtractionTask::SqliteDump {
        name: name.to_string(),
        path: safari_dir.join(file),
    };
    let dir = |name: &str, sub: &str| ExtractionTask::DirectoryListing {
        name: name.to_string(),
        path: safari_dir.join(sub),
    };
    vec![
        sqlite("history", "History.db"),
        dir("readingList", "ReadingListArchives"),
        sqlite("autoFillCorrections", "AutoFillCorrections.db"),
        sqlite("cloudAutoFillCorrections", "CloudAutoFillCorrections.db"),
        dir("formValues", "Form Values"),
    ]
}

/// Reads one task's source.
pub fn extract(task: &ExtractionTask) -> Result<Value, SourceError> {
    match task {
        ExtractionTask::SqliteDump { path, .. } => {
            let reader = StoreReader::open(path)?;
            Ok(Value::Object(reader.dump()?))
        }
        ExtractionTask::DirectoryListing { path, .. } => {
            let entries = fs::read_dir(path).map_err(|e| SourceError::Unavailable {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            let mut names: Vec<String> = entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            Ok(Value::from(names))
        }
    }
}

fn run_task(task: &ExtractionTask, out_dir: &Path) -> Result<PathBuf, ExportError> {
    let data = extract(task)?;
    let output = out_dir.join(format!("{}.json", task.name()));
    write_json(&output, &data)?;
    Ok(output)
}

/// Runs every task, logging and recording failures instead of stopping.
pub fn export_all(tasks: &[ExtractionTask], out_dir: &Path) -> Vec<ExtractionReport> {
    tasks
        .iter()
        .map(|task| match run_task(task, out_dir) {
            Ok(output) => ExtractionReport::Written {
                name: task.name().to_string(),
                output,
            },
            Err(e) => {
                warn!(task = task.name(), error = %e, "extraction failed; continuing");
                ExtractionReport::Failed {
                    name: task.name().to_string(),
                    reason: e.to_string(),
                }
            }
        })
        .collect()
}
