//! API integration tests
//!
//! Drive the router in-process against an in-memory document store.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_stream::StreamExt;
use tower::ServiceExt;

use visitor_log::{
    api::create_router,
    repository::Repository,
    services::Services,
    store::{memory::MemoryStore, BackendError},
    AppConfig, AppState,
};

fn app() -> Router {
    app_with(MemoryStore::new())
}

fn app_with(store: MemoryStore) -> Router {
    let repository = Repository::new(Arc::new(store), "visitors");
    create_router(AppState {
        config: Arc::new(AppConfig::default()),
        services: Arc::new(Services::new(repository)),
    })
}

/// Server-sent events read off a streaming response body
struct EventReader {
    body: axum::body::BodyDataStream,
    buffer: String,
}

impl EventReader {
    async fn open(app: &Router, uri: &str) -> Self {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );
        Self {
            body: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    /// Next `(event, data)` pair, or `None` once the body has ended
    async fn next(&mut self) -> Option<(String, Value)> {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let frame: String = self.buffer.drain(..end + 2).collect();
                let mut event = String::new();
                let mut data = String::new();
                for line in frame.lines() {
                    if let Some(name) = line.strip_prefix("event:") {
                        event = name.trim().to_string();
                    } else if let Some(payload) = line.strip_prefix("data:") {
                        data.push_str(payload.trim());
                    }
                }
                if event.is_empty() {
                    // keep-alive comment
                    continue;
                }
                return Some((event, serde_json::from_str(&data).unwrap()));
            }

            let chunk = timeout(Duration::from_secs(1), self.body.next())
                .await
                .expect("no event within a second")?;
            self.buffer
                .push_str(std::str::from_utf8(&chunk.unwrap()).unwrap());
        }
    }
}

async fn wait_for_subscribers(store: &MemoryStore, expected: usize) {
    for _ in 0..100 {
        if store.subscriber_count() == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(store.subscriber_count(), expected);
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn register(app: &Router, name: &str, purpose: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/visitors",
        Some(json!({
            "name": name,
            "contactNumber": "5550100",
            "address": "1 Main St",
            "purposeOfVisit": purpose
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn ids(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = send(&app, Method::GET, "/api/v1/ready", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_register_and_get_visitor() {
    let app = app();
    let id = register(&app, "Ada Lovelace", "Meeting").await;

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/visitors/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ada Lovelace");
    assert_eq!(body["status"], "Pending");
    assert_eq!(body["purposeOfVisit"], "meeting");
    assert_eq!(body["visitType"], "Personal");
    assert!(body["checkInTime"].is_null());
}

#[tokio::test]
async fn test_register_requires_name() {
    let app = app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/visitors",
        Some(json!({
            "name": "  ",
            "contactNumber": "5550100",
            "purposeOfVisit": "meeting"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_check_in_and_out() {
    let app = app();
    let id = register(&app, "Ada", "meeting").await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/visitors/{}/check-out", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "InvalidTransition");

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/visitors/{}/check-in", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "In");
    assert!(body["checkInTime"].is_string());

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/visitors/{}/check-out", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Out");
    assert!(body["checkOutTime"].is_string());
}

#[tokio::test]
async fn test_list_filters_by_status_and_department() {
    let app = app();
    let inside = register(&app, "Ada", "meeting").await;
    let pending = register(&app, "Bob", "delivery").await;

    send(
        &app,
        Method::POST,
        &format!("/api/v1/visitors/{}/check-in", inside),
        None,
    )
    .await;
    let (status, _) = send(
        &app,
        Method::PUT,
        &format!("/api/v1/visitors/{}/details", pending),
        Some(json!({ "whomToMeet": "Sarah Johnson", "department": "HR" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, "/api/v1/visitors", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = send(&app, Method::GET, "/api/v1/visitors?status=In", None).await;
    assert_eq!(ids(&body), vec![inside.as_str()]);

    let (_, body) = send(&app, Method::GET, "/api/v1/visitors?department=HR", None).await;
    assert_eq!(ids(&body), vec![pending.as_str()]);

    let (_, body) = send(&app, Method::GET, "/api/v1/visitors?search=johnson", None).await;
    assert_eq!(ids(&body), vec![pending.as_str()]);

    let (_, body) = send(
        &app,
        Method::GET,
        "/api/v1/visitors?sort_by=name&sort_order=asc",
        None,
    )
    .await;
    assert_eq!(ids(&body), vec![inside.as_str(), pending.as_str()]);
}

#[tokio::test]
async fn test_list_rejects_bad_filter() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/visitors?status=Gone", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/visitors?start_date=yesterday",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_visitor() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/visitors/missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NoSuchVisitor");
}

#[tokio::test]
async fn test_openapi_document() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/visitors"].is_object());
}

#[tokio::test]
async fn test_stream_pushes_snapshots_until_error() {
    let store = MemoryStore::new();
    let app = app_with(store.clone());
    register(&app, "Ada", "meeting").await;

    let mut events = EventReader::open(&app, "/api/v1/visitors/stream").await;
    let (event, data) = events.next().await.unwrap();
    assert_eq!(event, "snapshot");
    assert_eq!(data["count"], 1);
    assert_eq!(data["visitors"][0]["name"], "Ada");
    assert_eq!(store.subscriber_count(), 1);

    register(&app, "Bob", "delivery").await;
    let (event, data) = events.next().await.unwrap();
    assert_eq!(event, "snapshot");
    assert_eq!(data["count"], 2);

    store
        .push_error(
            "visitors",
            BackendError::new("permission-denied", "Missing or insufficient permissions"),
        )
        .unwrap();
    let (event, data) = events.next().await.unwrap();
    assert_eq!(event, "error");
    assert_eq!(data["error"], "PermissionDenied");
    assert!(data["code"].is_number());
    assert_eq!(data["retryable"], false);
    assert!(data["message"].is_string());

    assert!(events.next().await.is_none());
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn test_stream_applies_filter() {
    let store = MemoryStore::new();
    let app = app_with(store.clone());
    let inside = register(&app, "Ada", "meeting").await;
    register(&app, "Bob", "delivery").await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/visitors/{}/check-in", inside),
        None,
    )
    .await;

    let mut events = EventReader::open(&app, "/api/v1/visitors/stream?status=In").await;
    let (_, data) = events.next().await.unwrap();
    assert_eq!(data["count"], 1);
    assert_eq!(data["visitors"][0]["id"], inside.as_str());
}

#[tokio::test]
async fn test_stream_disconnect_cancels_subscription() {
    let store = MemoryStore::new();
    let app = app_with(store.clone());

    let mut events = EventReader::open(&app, "/api/v1/visitors/stream").await;
    let (event, data) = events.next().await.unwrap();
    assert_eq!(event, "snapshot");
    assert_eq!(data["count"], 0);
    assert_eq!(store.subscriber_count(), 1);

    drop(events);
    wait_for_subscribers(&store, 0).await;
}

#[tokio::test]
async fn test_stream_rejects_bad_filter() {
    let app = app();
    let (status, body) = send(&app, Method::GET, "/api/v1/visitors/stream?status=Gone", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}
