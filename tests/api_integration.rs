//! Integration tests for the registry HTTP API

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use proctorlock::service::{create_router, FileUidStore, MemoryUidStore, Roster, UidStore};

fn roster_router() -> (Router, Arc<MemoryUidStore>) {
    let store = Arc::new(MemoryUidStore::new(Some(Roster::from_uids(["FX-001", "FX-002"]))));
    (create_router(store.clone()), store)
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, store) = roster_router();
    store.mark_used("FX-002").unwrap();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], proctorlock::VERSION);
    assert_eq!(json["completions"], 1);
}

#[tokio::test]
async fn test_login_status_codes() {
    let (app, store) = roster_router();

    let (status, json) = post(&app, "/api/login", r#"{"uid": "FX-001"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "UID is valid.");

    let (status, json) = post(&app, "/api/login", r#"{"uid": "FX-999"}"#).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);

    store.mark_used("FX-002").unwrap();
    let (status, json) = post(&app, "/api/login", r#"{"uid": "FX-002"}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["message"], "This UID has already been used.");
}

#[tokio::test]
async fn test_missing_uid_is_bad_request() {
    let (app, _store) = roster_router();
    for body in [r#"{}"#, r#"{"uid": ""}"#, r#"{"uid": "   "}"#, "not json"] {
        for uri in ["/api/login", "/api/complete"] {
            let (status, json) = post(&app, uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, body);
            assert_eq!(json["message"], "UID is required.");
        }
    }
}

#[tokio::test]
async fn test_complete_is_idempotent() {
    let (app, store) = roster_router();

    let (first, _) = post(&app, "/api/complete", r#"{"uid": "FX-001"}"#).await;
    let (second, json) = post(&app, "/api/complete", r#"{"uid": "FX-001"}"#).await;
    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(store.completion_count().unwrap(), 1);

    let (status, _) = post(&app, "/api/login", r#"{"uid": "FX-001"}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_without_roster_any_fresh_uid_is_valid() {
    let app = create_router(Arc::new(MemoryUidStore::new(None)));
    let (status, _) = post(&app, "/api/login", r#"{"uid": "whoever"}"#).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_storage_failure_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("completions.json");
    std::fs::write(&path, "garbage").unwrap();
    let app = create_router(Arc::new(FileUidStore::new(path, None)));

    let (status, json) = post(&app, "/api/login", r#"{"uid": "FX-001"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["success"], false);

    let (status, _) = post(&app, "/api/complete", r#"{"uid": "FX-001"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_file_store_survives_router_rebuild() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("completions.json");

    let app = create_router(Arc::new(FileUidStore::new(path.clone(), None)));
    let (status, _) = post(&app, "/api/complete", r#"{"uid": "FX-001"}"#).await;
    assert_eq!(status, StatusCode::OK);

    let rebuilt = create_router(Arc::new(FileUidStore::new(path, None)));
    let (status, _) = post(&rebuilt, "/api/login", r#"{"uid": "FX-001"}"#).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
