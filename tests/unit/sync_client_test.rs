//! Tests for the sync client against stub ingest endpoints.

use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::post;
use axum::{Json, Router};
use historysync::services::normalizer::format_datetime;
use historysync::services::sync_client::SyncClient;
use historysync::types::errors::SyncError;
use historysync::types::event::Event;
use serde_json::{json, Value};

const T: i64 = 1_700_000_000_000;

/// Serves a fixed reply body on `POST /insert`.
async fn spawn_stub(reply: Value) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/insert", post(move || async move { Json(reply) }));
    tokio::spawn(async move { axum::serve(listener, app).await });
    addr
}

fn client(addr: SocketAddr) -> SyncClient {
    SyncClient::new(Some(format!("http://{}", addr)), Duration::from_secs(5)).unwrap()
}

fn batch() -> Vec<Event> {
    vec![Event {
        url: "https://a.example".to_string(),
        visited_at: T,
        title: "A".to_string(),
        datetime: format_datetime(T).unwrap(),
        next_visited_at: None,
        duration: None,
    }]
}

#[tokio::test]
async fn test_reply_with_integer_row_id_is_accepted() {
    let addr = spawn_stub(json!({
        "success": true,
        "inserted": 1,
        "latestItem": {
            "id": 7,
            "url": "https://old.example",
            "visitedAt": T - 1,
            "nextVisitedAt": null,
            "title": "Old",
            "datetime": "2023-11-14T22:13:19.999Z",
            "duration": null
        }
    }))
    .await;

    let reply = client(addr).submit(&batch()).await.unwrap();
    assert_eq!(reply.inserted, 1);
    assert_eq!(reply.high_water_mark(), Some(T - 1));
}

#[tokio::test]
async fn test_reply_without_latest_item() {
    let addr = spawn_stub(json!({ "success": true, "inserted": 3, "latestItem": null })).await;

    let reply = client(addr).submit(&batch()).await.unwrap();
    assert_eq!(reply.inserted, 3);
    assert_eq!(reply.high_water_mark(), None);
}

#[tokio::test]
async fn test_unsuccessful_reply_is_transport_error() {
    let addr = spawn_stub(json!({ "success": false, "error": "nope" })).await;

    let result = client(addr).submit(&batch()).await;
    assert!(matches!(result, Err(SyncError::Transport(_))));
}

#[tokio::test]
async fn test_non_json_reply_is_serialization_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().route("/insert", post(|| async { "ok" }));
    tokio::spawn(async move { axum::serve(listener, app).await });

    let result = client(addr).submit(&batch()).await;
    assert!(matches!(result, Err(SyncError::Serialization(_))));
}
