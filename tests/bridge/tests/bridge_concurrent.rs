//! Concurrent access: many clients hitting one gateway at once.
//!
//! Session ids must stay unique under load, and concurrent calls on one
//! session must never observe a half-initialized engine.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;
use tokio::sync::Barrier;

use dr_mcp_gateway::types::{Call, McpError};
use dr_mcp_gateway::{AuthGate, Dispatcher, SessionStore, ToolRegistry};
use dr_records::{schema, SqliteStorage, Storage};

const AUTH: Option<&str> = Some("Bearer bridge-secret");

// ─── Helpers ───────────────────────────────────────────────────────────────

fn create_dispatcher() -> Arc<Dispatcher> {
    let storage = SqliteStorage::open_in_memory().expect("open db");
    schema::bootstrap(&storage).expect("bootstrap");
    let storage: Arc<dyn Storage> = Arc::new(storage);
    let registry = ToolRegistry::with_builtin_tools(storage).expect("register tools");
    let store = Arc::new(SessionStore::new(Arc::new(registry)));
    Arc::new(Dispatcher::new(
        AuthGate::new(Some("bridge-secret".to_string())),
        store,
    ))
}

// ─── Tests ─────────────────────────────────────────────────────────────────

/// N concurrent initializes yield N distinct, immediately usable sessions.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_initialize_ids_are_unique() {
    const N: usize = 1000;
    let dispatcher = create_dispatcher();
    let barrier = Arc::new(Barrier::new(N));

    let mut handles = Vec::with_capacity(N);
    for _ in 0..N {
        let dispatcher = Arc::clone(&dispatcher);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let out = dispatcher.dispatch(AUTH, Call::initialize()).await;
            assert!(out.result.is_ok(), "{:?}", out.result);
            out.session_id.expect("session id")
        }));
    }

    let mut ids = HashSet::with_capacity(N);
    for handle in handles {
        assert!(ids.insert(handle.await.unwrap()), "duplicate session id");
    }
    assert_eq!(ids.len(), N);
    assert_eq!(dispatcher.store().len().await, N);

    for id in ids.iter().take(50) {
        let out = dispatcher
            .dispatch(AUTH, Call::tool("ping", json!({"message": "x"})).with_session(id))
            .await;
        assert_eq!(out.result.unwrap()["echo"], "x");
    }
}

/// Concurrent tool calls on one session all succeed.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_share_a_session() {
    let dispatcher = create_dispatcher();
    let session = dispatcher
        .dispatch(AUTH, Call::initialize())
        .await
        .session_id
        .unwrap();

    let mut handles = vec![];
    for i in 0..100 {
        let dispatcher = Arc::clone(&dispatcher);
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            let call = Call::tool("create_lead", json!({"name": format!("Lead {i}")}))
                .with_session(session);
            dispatcher.dispatch(AUTH, call).await.result
        }));
    }

    let mut lead_ids = HashSet::new();
    for handle in handles {
        let out = handle.await.unwrap().unwrap();
        assert!(lead_ids.insert(out["lead_id"].as_i64().unwrap()));
    }

    let listed = dispatcher
        .dispatch(
            AUTH,
            Call::tool("list_leads", json!({"limit": 200})).with_session(session),
        )
        .await
        .result
        .unwrap();
    assert_eq!(listed["count"], 100);
}

/// Closing a session while calls are in flight: every call either completes
/// or reports `SessionNotFound`; nothing else.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_terminate_races_with_calls() {
    let dispatcher = create_dispatcher();
    let session = dispatcher
        .dispatch(AUTH, Call::initialize())
        .await
        .session_id
        .unwrap();

    let mut handles = vec![];
    for i in 0..200 {
        let dispatcher = Arc::clone(&dispatcher);
        let session = session.clone();
        handles.push(tokio::spawn(async move {
            if i == 100 {
                dispatcher.terminate(AUTH, Some(session.as_str())).await.result.map(|_| ())
            } else {
                let call = Call::tool("ping", json!({})).with_session(session);
                dispatcher.dispatch(AUTH, call).await.result.map(|_| ())
            }
        }));
    }

    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) | Err(McpError::SessionNotFound(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(dispatcher.store().resolve(&session).await.is_err());
}
