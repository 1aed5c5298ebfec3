use std::path::PathBuf;

/// One independent extraction over the browser's data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionTask {
    /// Dump every table of a SQLite database.
    SqliteDump { name: String, path: PathBuf },
    /// List the entries of a directory.
    DirectoryListing { name: String, path: PathBuf },
}

impl ExtractionTask {
    pub fn name(&self) -> &str {
        match self {
            ExtractionTask::SqliteDump { name, .. } => name,
            ExtractionTask::DirectoryListing { name, .. } => name,
        }
    }
}

/// Result of a single extraction task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionReport {
    Written { name: String, output: PathBuf },
    Failed { name: String, reason: String },
}

impl ExtractionReport {
    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionReport::Written { .. })
    }
}
