//! Integration Tests for API Endpoints
//!
//! Tests full request/response cycle for each endpoint.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use hmac_cache::cache::{CacheSettings, DuplicatePolicy, ExpiringKeyCache, ManualClock};
use hmac_cache::storage::{MemoryBackend, SqliteBackend, TableSchema};
use hmac_cache::{api::create_router, AppState};
use serde_json::Value;
use tower::ServiceExt;

const T: i64 = 1_700_000_000;

// == Helper Functions ==

fn create_test_app() -> Router {
    create_app_with(0, DuplicatePolicy::Replace).0
}

fn create_app_with(max_age: u64, on_duplicate: DuplicatePolicy) -> (Router, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(T));
    let cache = ExpiringKeyCache::with_clock(
        Arc::new(MemoryBackend::new()),
        CacheSettings {
            max_age,
            on_duplicate,
        },
        clock.clone(),
    );
    (create_router(AppState::new(cache)), clock)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, body_to_json(response.into_body()).await)
}

async fn save(app: &Router, key: &str, value: &str) -> StatusCode {
    let body = serde_json::json!({ "key": key, "value": value }).to_string();
    send(app, "PUT", "/save", Some(&body)).await.0
}

// == SAVE Endpoint Tests ==

#[tokio::test]
async fn test_save_endpoint_success() {
    let app = create_test_app();

    let (status, json) = send(
        &app,
        "PUT",
        "/save",
        Some(r#"{"key":"abc123","value":"abc123"}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "abc123");
    assert!(json["message"].as_str().unwrap().contains("abc123"));
}

#[tokio::test]
async fn test_save_endpoint_with_expire_after() {
    let app = create_test_app();

    let (status, _) = send(
        &app,
        "PUT",
        "/save",
        Some(r#"{"key":"k","value":"v","expire_after":1}"#),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
}

async fn send_raw_save(app: &Router, body: &'static str) -> (StatusCode, String, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/save")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    (status, content_type, body_to_json(response.into_body()).await)
}

#[tokio::test]
async fn test_invalid_json_request() {
    let app = create_test_app();

    let (status, content_type, json) = send_raw_save(&app, "{not json").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(json["error"].as_str().unwrap().starts_with("Invalid request"));
}

#[tokio::test]
async fn test_missing_value_field_request() {
    let app = create_test_app();

    let (status, content_type, json) = send_raw_save(&app, r#"{"key":"k"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(content_type.starts_with("application/json"));
    assert!(json["error"].as_str().unwrap().contains("value"));

    let (status, _) = send(&app, "GET", "/load/k", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_key_request() {
    let app = create_test_app();

    let (status, json) = send(&app, "PUT", "/save", Some(r#"{"key":"","value":"v"}"#)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("empty"));
}

#[tokio::test]
async fn test_duplicate_save_rejected() {
    let (app, _) = create_app_with(0, DuplicatePolicy::Reject);

    assert_eq!(save(&app, "sig", "first").await, StatusCode::OK);
    assert_eq!(save(&app, "sig", "second").await, StatusCode::CONFLICT);

    let (_, json) = send(&app, "GET", "/load/sig", None).await;
    assert_eq!(json["value"], "first");
}

// == LOAD Endpoint Tests ==

#[tokio::test]
async fn test_load_endpoint_success() {
    let app = create_test_app();
    assert_eq!(save(&app, "load_key", "load_value").await, StatusCode::OK);

    let (status, json) = send(&app, "GET", "/load/load_key", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["key"], "load_key");
    assert_eq!(json["value"], "load_value");
}

#[tokio::test]
async fn test_load_ignores_offset_and_limit() {
    let app = create_test_app();
    save(&app, "k", "v").await;

    let (status, json) = send(&app, "GET", "/load/k?offset=10&limit=0", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["value"], "v");
}

#[tokio::test]
async fn test_load_endpoint_not_found() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/load/nonexistent", None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(json["error"].as_str().unwrap().contains("nonexistent"));
}

// == DELETE Endpoint Tests ==

#[tokio::test]
async fn test_delete_endpoint_success() {
    let app = create_test_app();
    save(&app, "abc123", "abc123").await;

    let (status, json) = send(&app, "DELETE", "/delete/abc123", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["message"].as_str().unwrap().contains("abc123"));

    let (status, _) = send(&app, "GET", "/load/abc123", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_endpoint_missing_key() {
    let app = create_test_app();

    let (status, _) = send(&app, "DELETE", "/delete/never_saved", None).await;

    assert_eq!(status, StatusCode::OK);
}

// == CLEAR / PRUNE Endpoint Tests ==

#[tokio::test]
async fn test_clear_keeps_entries() {
    let app = create_test_app();
    save(&app, "a", "1").await;
    save(&app, "b", "2").await;

    let (status, json) = send(&app, "POST", "/clear", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cleared"], true);

    let (status, _) = send(&app, "GET", "/load/a", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 2);
}

#[tokio::test]
async fn test_expiry_via_api() {
    let (app, clock) = create_app_with(10, DuplicatePolicy::Replace);
    save(&app, "old", "v").await;

    clock.advance(9);
    save(&app, "young", "v").await;
    let (_, json) = send(&app, "POST", "/prune", None).await;
    assert_eq!(json["removed"], 0);

    clock.advance(2);
    let (status, _) = send(&app, "GET", "/load/old", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND, "expired entries are not loadable");

    let (status, json) = send(&app, "POST", "/prune", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["removed"], 1);

    let (status, _) = send(&app, "GET", "/load/young", None).await;
    assert_eq!(status, StatusCode::OK);
}

// == STATS / HEALTH Endpoint Tests ==

#[tokio::test]
async fn test_stats_endpoint() {
    let (app, _) = create_app_with(60, DuplicatePolicy::Replace);
    save(&app, "k", "v").await;
    send(&app, "GET", "/load/k", None).await;
    send(&app, "GET", "/load/missing", None).await;

    let (status, json) = send(&app, "GET", "/stats", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["saves"], 1);
    assert_eq!(json["total_entries"], 1);
    assert_eq!(json["max_age"], 60);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app();

    let (status, json) = send(&app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
}

// == SQLite-backed Server ==

#[tokio::test]
async fn test_sqlite_backed_router() {
    let schema = TableSchema::new("t_", "hmac_cache", "hmac", "data", "ts").unwrap();
    let cache = ExpiringKeyCache::new(
        Arc::new(SqliteBackend::open_in_memory(schema).unwrap()),
        CacheSettings {
            max_age: 300,
            on_duplicate: DuplicatePolicy::Reject,
        },
    );
    let app = create_router(AppState::new(cache));

    let hostile = "x' OR '1'='1";
    assert_eq!(save(&app, hostile, "v").await, StatusCode::OK);
    assert_eq!(save(&app, hostile, "v").await, StatusCode::CONFLICT);

    let (status, _) = send(&app, "GET", "/load/abc", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, "DELETE", "/delete/abc", None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_sqlite_backed_router_concurrent_requests() {
    let cache = ExpiringKeyCache::new(
        Arc::new(SqliteBackend::open_in_memory(TableSchema::default()).unwrap()),
        CacheSettings {
            max_age: 300,
            on_duplicate: DuplicatePolicy::Reject,
        },
    );
    let app = create_router(AppState::new(cache));

    let mut handles = Vec::new();
    for i in 0..32 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let key = format!("sig{}", i);
            let saved = save(&app, &key, "payload").await;
            let (loaded, json) = send(&app, "GET", &format!("/load/{}", key), None).await;
            let (pruned, _) = send(&app, "POST", "/prune", None).await;
            (saved, loaded, json["value"].clone(), pruned)
        }));
    }

    for handle in handles {
        let (saved, loaded, value, pruned) = handle.await.unwrap();
        assert_eq!(saved, StatusCode::OK);
        assert_eq!(loaded, StatusCode::OK);
        assert_eq!(value, "payload");
        assert_eq!(pruned, StatusCode::OK);
    }

    let (_, stats) = send(&app, "GET", "/stats", None).await;
    assert_eq!(stats["total_entries"], 32);
    assert_eq!(stats["saves"], 32);
    assert_eq!(stats["hits"], 32);
}
