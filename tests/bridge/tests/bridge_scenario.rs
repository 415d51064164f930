//! End to end: HTTP router over a file-backed record store.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tempfile::tempdir;
use tower::ServiceExt;

use dr_mcp_gateway::transport::{build_router, AppState};
use dr_mcp_gateway::{AuthGate, Dispatcher, SessionStore, ToolRegistry};
use dr_records::{schema, SqliteConfig, SqliteStorage, Storage};

// ─── Helpers ───────────────────────────────────────────────────────────────

fn create_app(path: &std::path::Path) -> Router {
    let storage = SqliteStorage::open(SqliteConfig::with_path(path)).expect("open db");
    schema::bootstrap(&storage).expect("bootstrap");
    let storage: Arc<dyn Storage> = Arc::new(storage);
    let registry = ToolRegistry::with_builtin_tools(Arc::clone(&storage)).expect("tools");
    let store = Arc::new(SessionStore::new(Arc::new(registry)));
    let dispatcher = Arc::new(Dispatcher::new(
        AuthGate::new(Some("e2e".to_string())),
        store,
    ));
    build_router(AppState::new(dispatcher, storage))
}

async fn post_call(app: &Router, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/call")
        .header("authorization", "Bearer e2e")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn open_session(app: &Router) -> String {
    let (status, body) = post_call(app, json!({"method": "initialize"})).await;
    assert_eq!(status, StatusCode::OK);
    body["session_id"].as_str().unwrap().to_string()
}

// ─── Tests ─────────────────────────────────────────────────────────────────

/// Leads written through one server survive a restart.
#[tokio::test]
async fn test_leads_persist_across_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("records").join("dr.db");

    {
        let app = create_app(&path);
        let session = open_session(&app).await;
        for name in ["Ada", "Grace", "Barbara"] {
            let (status, body) = post_call(
                &app,
                json!({
                    "tool": "create_lead",
                    "args": {"name": name, "source": "referral"},
                    "session_id": session
                }),
            )
            .await;
            assert_eq!(status, StatusCode::OK, "{body}");
        }
    }

    let app = create_app(&path);
    let session = open_session(&app).await;
    let (status, body) = post_call(
        &app,
        json!({"tool": "list_leads", "args": {"status": "new"}, "session_id": session}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["count"], 3);
}

/// Sessions are per process: ids from a previous server are unknown.
#[tokio::test]
async fn test_sessions_do_not_survive_restart() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("dr.db");

    let stale = open_session(&create_app(&path)).await;

    let app = create_app(&path);
    let (status, body) = post_call(
        &app,
        json!({"tool": "ping", "session_id": stale}),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "SessionNotFound");
}

/// Health check reflects live sessions.
#[tokio::test]
async fn test_health_counts_sessions() {
    let dir = tempdir().unwrap();
    let app = create_app(&dir.path().join("dr.db"));
    open_session(&app).await;
    open_session(&app).await;

    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["sessions"], 2);
    assert_eq!(body["storage"], "ok");
}
