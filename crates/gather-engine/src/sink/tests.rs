//! HTTP sink tests against an in-process server.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use gather_common::SinkError;
use serde_json::Value;

use super::*;
use crate::event::EventKind;
use crate::identity::Identity;

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
    /// Identifiers the server rejects with a 500.
    reject: Arc<Vec<String>>,
    always_fail: bool,
}

async fn capture(
    State(state): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> StatusCode {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    state.auth.lock().unwrap().push(auth);

    let identifier = body
        .get("identifier")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();
    state.bodies.lock().unwrap().push(body);

    if state.always_fail || state.reject.contains(&identifier) {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    }
}

async fn serve(state: Captured) -> String {
    let app = Router::new().route("/hook", post(capture)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/hook")
}

fn event(id: &str, kind: EventKind, identity: Identity) -> Event {
    let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
    Event::new(kind, id.into(), identity, ts)
}

#[tokio::test]
async fn webhook_posts_one_request_per_event() {
    let state = Captured::default();
    let url = serve(state.clone()).await;
    let sink = WebhookSink::new(url, Duration::from_secs(5)).unwrap();

    let batch = vec![
        event("42", EventKind::Join, Identity::named("Ada")),
        event("42", EventKind::Leave, Identity::unknown()),
    ];
    sink.deliver(&batch).await.unwrap();

    let bodies = state.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 2);
    assert_eq!(bodies[0]["identifier"], "42");
    assert_eq!(bodies[0]["identityName"], "Ada");
    assert_eq!(bodies[0]["kind"], "join");
    assert_eq!(bodies[0]["timestamp"], "2024-05-01T12:00:00.000Z");
    assert_eq!(bodies[1]["kind"], "leave");
    assert!(bodies[1].get("identityName").is_none());
}

#[tokio::test]
async fn webhook_failure_is_per_event() {
    let state = Captured {
        reject: Arc::new(vec!["B".into()]),
        ..Default::default()
    };
    let url = serve(state.clone()).await;
    let sink = WebhookSink::new(url, Duration::from_secs(5)).unwrap();

    let batch = vec![
        event("A", EventKind::Join, Identity::unknown()),
        event("B", EventKind::Join, Identity::unknown()),
        event("C", EventKind::Join, Identity::unknown()),
    ];
    let err = sink.deliver(&batch).await.unwrap_err();

    // All three were attempted, only B needs a retry.
    assert_eq!(state.bodies.lock().unwrap().len(), 3);
    assert_eq!(err.undelivered(batch.len()), vec![1]);
    assert!(matches!(err, SinkError::Partial { total: 3, .. }));
}

#[tokio::test]
async fn webhook_unreachable_fails_every_event() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let sink = WebhookSink::new(format!("http://{addr}/hook"), Duration::from_secs(2)).unwrap();
    let batch = vec![
        event("A", EventKind::Join, Identity::unknown()),
        event("B", EventKind::Leave, Identity::unknown()),
    ];
    let err = sink.deliver(&batch).await.unwrap_err();
    assert_eq!(err.undelivered(batch.len()), vec![0, 1]);
}

#[tokio::test]
async fn append_log_sends_one_bulk_request() {
    let state = Captured::default();
    let url = serve(state.clone()).await;
    let sink = AppendLogSink::new(
        url,
        "Presence",
        Some("tok".into()),
        true,
        Duration::from_secs(5),
    )
    .unwrap();

    let batch = vec![
        event("1", EventKind::Join, Identity::named("Ada")),
        event("2", EventKind::Join, Identity::unknown()),
        event("1", EventKind::Leave, Identity::named("Ada")),
    ];
    sink.deliver(&batch).await.unwrap();

    let bodies = state.bodies.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["range"], "Presence");
    assert_eq!(body["majorDimension"], "ROWS");
    let rows = body["values"].as_array().unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows[0],
        serde_json::json!(["1", "join", "2024-05-01T12:00:00.000Z", "Ada"])
    );
    assert_eq!(rows[1][3], "unknown");
    assert_eq!(rows[2][1], "leave");

    let auth = state.auth.lock().unwrap().clone();
    assert_eq!(auth, vec![Some("Bearer tok".to_string())]);
}

#[tokio::test]
async fn append_log_rows_without_names() {
    let sink = AppendLogSink::new(
        "http://127.0.0.1:9/unused",
        "Presence",
        None,
        false,
        Duration::from_secs(1),
    )
    .unwrap();
    let row = sink.row(&event("5", EventKind::Join, Identity::named("Grace")));
    assert_eq!(row, vec!["5", "join", "2024-05-01T12:00:00.000Z"]);
}

#[tokio::test]
async fn append_log_failure_is_all_or_nothing() {
    let state = Captured {
        always_fail: true,
        ..Default::default()
    };
    let url = serve(state.clone()).await;
    let sink = AppendLogSink::new(url, "Presence", None, true, Duration::from_secs(5)).unwrap();

    let batch = vec![
        event("1", EventKind::Join, Identity::unknown()),
        event("2", EventKind::Join, Identity::unknown()),
    ];
    let err = sink.deliver(&batch).await.unwrap_err();
    assert!(matches!(err, SinkError::Rejected { status: 500, .. }));
    assert_eq!(err.undelivered(batch.len()), vec![0, 1]);
}

#[tokio::test]
async fn append_log_skips_empty_batches() {
    let state = Captured::default();
    let url = serve(state.clone()).await;
    let sink = AppendLogSink::new(url, "Presence", None, true, Duration::from_secs(5)).unwrap();
    sink.deliver(&[]).await.unwrap();
    assert!(state.bodies.lock().unwrap().is_empty());
}
