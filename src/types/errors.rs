use thiserror::Error;

// === SourceError ===

/// Errors raised while reading the local browser data store.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The store is missing, locked, or not a readable SQLite database.
    #[error("Source unavailable: {path}: {reason}")]
    Unavailable { path: String, reason: String },
    /// A query against an opened store failed.
    #[error("Source query failed: {0}")]
    Query(String),
}

// === SyncError ===

/// Errors related to submitting a batch to the ingest endpoint.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Required sync configuration is missing or unusable.
    #[error("Sync configuration error: {0}")]
    Config(String),
    /// The request failed or the endpoint answered with a non-success status.
    #[error("Sync transport error: {0}")]
    Transport(String),
    /// The batch or the response body could not be (de)serialized.
    #[error("Sync serialization error: {0}")]
    Serialization(String),
}

// === StorageError ===

/// Errors related to the ingest-side event store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database operation failed; nothing from the batch was committed.
    #[error("Storage database error: {0}")]
    Database(String),
    /// The submitted batch was rejected before touching the database.
    #[error("Invalid batch: {0}")]
    InvalidBatch(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

// === StateError ===

/// Errors related to persisting the poller's sync state.
#[derive(Debug, Error)]
pub enum StateError {
    /// An I/O error occurred while reading or writing the state file.
    #[error("Sync state I/O error: {0}")]
    Io(String),
    /// The state file could not be parsed or written as JSON.
    #[error("Sync state serialization error: {0}")]
    Serialization(String),
}

// === SettingsError ===

/// Errors related to loading or saving settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    Io(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    Serialization(String),
    /// A settings value (file or environment) is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}

// === ExportError ===

/// Errors related to one-shot file exports.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Export I/O error: {0}")]
    Io(String),
    #[error("Export serialization error: {0}")]
    Serialization(String),
    #[error(transparent)]
    Source(#[from] SourceError),
}

// === CycleError ===

/// Any stage failure that abandons a single poll cycle.
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error(transparent)]
    State(#[from] StateError),
}

// === IngestError ===

/// Errors returned by the ingest HTTP handlers.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The read endpoint was called from a non-local origin.
    #[error("The GET endpoint only works locally")]
    NotLocal,
    #[error("Not found")]
    NotFound,
    /// The request body is not a JSON array of events.
    #[error("Malformed request body: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The blocking task failed or the database lock was poisoned.
    #[error("Ingest internal error: {0}")]
    Internal(String),
}
