//! HTTP surface of the ingest service.
//!
//! Routes:
//! - `POST /insert` takes a JSON array of events and applies the dedup insert.
//! - `GET /` lists every stored row, for local callers only.
//! - `GET /health` is a liveness probe.
//!
//! Anything else is a 404. Failures answer with `{"success": false, "error": ...}`.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::header::HOST;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::database::Database;
use crate::managers::event_store::{EventStore, EventStoreTrait};
use crate::types::errors::{IngestError, StorageError};
use crate::types::event::{Event, StoredEvent};
use crate::types::sync::{ErrorResponse, InsertResponse};

/// Shared handler state. The connection is used by one request at a time.
#[derive(Clone)]
pub struct IngestState {
    db: Arc<Mutex<Database>>,
}

impl IngestState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Runs `f` against the event store on the blocking pool.
    async fn with_store<T, F>(&self, f: F) -> Result<T, IngestError>
    where
        T: Send + 'static,
        F: FnOnce(&mut EventStore<'_>) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| IngestError::Internal(format!("database lock poisoned: {}", e)))?;
            let mut store = EventStore::new(guard.connection());
            f(&mut store).map_err(IngestError::from)
        })
        .await
        .map_err(|e| IngestError::Internal(e.to_string()))?
    }
}

impl IntoResponse for IngestError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotLocal => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) | Self::Storage(StorageError::InvalidBatch(_)) => {
                StatusCode::BAD_REQUEST
            }
            Self::Storage(StorageError::Database(_)) | Self::Internal(_) => {
                error!(error = %self, "ingest request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

/// Builds the ingest router.
///
/// The body limit is lifted: a first-run submission carries the whole local
/// history in one request.
pub fn router(state: IngestState) -> Router {
    Router::new()
        .route("/", get(list_events).fallback(not_found))
        .route("/insert", post(insert_events).fallback(not_found))
        .route("/health", get(health).fallback(not_found))
        .fallback(not_found)
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

/// Serves the ingest router on `listener` until `shutdown` resolves.
///
/// The peer address is recorded per connection for the local-origin check.
pub async fn serve<F>(listener: TcpListener, state: IngestState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

/// True when the `Host` authority names the loopback host (any port).
pub fn host_is_local(host: &str) -> bool {
    let host = host.trim();
    let name = match host.strip_prefix('[') {
        Some(rest) => match rest.split_once(']') {
            Some((name, port)) if port.is_empty() || port.starts_with(':') => name,
            _ => return false,
        },
        None => host.split(':').next().unwrap_or_default(),
    };
    name.eq_ignore_ascii_case("localhost") || name == "127.0.0.1" || name == "::1"
}

async fn insert_events(
    State(state): State<IngestState>,
    body: Bytes,
) -> Result<Json<InsertResponse>, IngestError> {
    let events: Vec<Event> =
        serde_json::from_slice(&body).map_err(|e| IngestError::BadRequest(e.to_string()))?;
    let received = events.len();

    let outcome = state
        .with_store(move |store| store.insert_batch(&events))
        .await?;

    info!(received, inserted = outcome.inserted, "batch ingested");
    Ok(Json(InsertResponse {
        success: true,
        inserted: outcome.inserted,
        latest_item: outcome.latest_item,
    }))
}

async fn list_events(
    State(state): State<IngestState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Vec<StoredEvent>>, IngestError> {
    let host = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !host_is_local(host) || !peer.ip().is_loopback() {
        warn!(%peer, host, "rejected non-local read");
        return Err(IngestError::NotLocal);
    }

    let rows = state.with_store(|store| store.list_all()).await?;
    Ok(Json(rows))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn not_found() -> IngestError {
    IngestError::NotFound
}
