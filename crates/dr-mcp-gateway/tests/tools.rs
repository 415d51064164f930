//! Built-in record tools against a seeded SQLite store.

mod common;

use std::sync::Arc;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use dr_mcp_gateway::types::{ErrorKind, McpError};

use common::fixtures::{builtin_registry, seeded_storage, FailingStorage};

#[tokio::test]
async fn test_catalog_is_sorted_and_closed() {
    let registry = builtin_registry(seeded_storage());
    let names: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
    assert_eq!(
        names,
        [
            "create_lead",
            "get_case",
            "list_cases",
            "list_events",
            "list_leads",
            "ping"
        ]
    );
    for def in registry.list_tools() {
        assert_eq!(def.input_schema["additionalProperties"], false, "{}", def.name);
    }
}

#[tokio::test]
async fn test_ping_echoes_message() {
    let registry = builtin_registry(seeded_storage());
    let ping = registry.get("ping").unwrap();

    let out = assert_ok!(ping.invoke(json!({"message": "hi"})).await);
    assert_eq!(out, json!({"pong": true, "echo": "hi"}));

    let out = assert_ok!(ping.invoke(serde_json::Value::Null).await);
    assert_eq!(out["echo"], serde_json::Value::Null);
}

#[tokio::test]
async fn test_list_cases_filters_by_status() {
    let registry = builtin_registry(seeded_storage());
    let tool = registry.get("list_cases").unwrap();

    let all = tool.invoke(json!({})).await.unwrap();
    assert_eq!(all["count"], 2);
    assert_eq!(all["cases"][0]["number"], "2026-CV-001");

    let closed = tool.invoke(json!({"status": "closed"})).await.unwrap();
    assert_eq!(closed["count"], 1);
    assert_eq!(closed["cases"][0]["client_name"], "Doe");
    assert_eq!(closed["cases"][0]["court"], serde_json::Value::Null);

    let limited = tool.invoke(json!({"limit": 1})).await.unwrap();
    assert_eq!(limited["count"], 1);
}

#[tokio::test]
async fn test_get_case_includes_events_in_order() {
    let registry = builtin_registry(seeded_storage());
    let out = registry
        .get("get_case")
        .unwrap()
        .invoke(json!({"case_id": 1}))
        .await
        .unwrap();
    assert_eq!(out["case"]["title"], "Smith v. Jones");
    let kinds: Vec<_> = out["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["kind"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, ["deadline", "hearing"]);
}

#[tokio::test]
async fn test_get_missing_case_is_storage_error() {
    let registry = builtin_registry(seeded_storage());
    let err = registry
        .get("get_case")
        .unwrap()
        .invoke(json!({"case_id": 99}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Storage);
    assert!(err.to_string().contains("case 99 not found"));
}

#[tokio::test]
async fn test_list_events_from_date() {
    let registry = builtin_registry(seeded_storage());
    let tool = registry.get("list_events").unwrap();

    let upcoming = tool.invoke(json!({"from": "2026-01-01"})).await.unwrap();
    assert_eq!(upcoming["count"], 2);
    assert_eq!(upcoming["events"][0]["case_number"], "2026-CV-001");

    let one_case = tool.invoke(json!({"case_id": 2})).await.unwrap();
    assert_eq!(one_case["count"], 1);

    assert_err!(tool.invoke(json!({"from": "next week"})).await);
}

#[tokio::test]
async fn test_create_lead_then_list() {
    let registry = builtin_registry(seeded_storage());
    let created = registry
        .get("create_lead")
        .unwrap()
        .invoke(json!({"name": "  Grace Prospect ", "email": "grace@example.com"}))
        .await
        .unwrap();
    assert_eq!(created["status"], "new");
    assert!(created["lead_id"].as_i64().unwrap() > 1);

    let fresh = registry
        .get("list_leads")
        .unwrap()
        .invoke(json!({"status": "new"}))
        .await
        .unwrap();
    assert_eq!(fresh["count"], 1);
    assert_eq!(fresh["leads"][0]["name"], "Grace Prospect");
}

#[tokio::test]
async fn test_create_lead_rejects_blank_and_extra_fields() {
    let registry = builtin_registry(seeded_storage());
    let tool = registry.get("create_lead").unwrap();

    let err = tool.invoke(json!({"name": "   "})).await.unwrap_err();
    assert!(matches!(err, McpError::ArgumentValidation { .. }));

    let err = tool.invoke(json!({"name": "X", "ssn": "1"})).await.unwrap_err();
    assert!(matches!(err, McpError::ArgumentValidation { ref tool, .. } if tool == "create_lead"));

    let err = tool.invoke(json!({})).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ArgumentValidation);
}

#[tokio::test]
async fn test_storage_failures_surface_unchanged() {
    let registry = builtin_registry(Arc::new(FailingStorage));
    for (name, args) in [
        ("list_cases", json!({})),
        ("get_case", json!({"case_id": 1})),
        ("list_events", json!({})),
        ("list_leads", json!({})),
        ("create_lead", json!({"name": "Someone"})),
    ] {
        let err = registry.get(name).unwrap().invoke(args).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Storage, "{name}");
        assert!(err.to_string().contains("database is unavailable"), "{name}");
    }
}

#[tokio::test]
async fn test_unknown_tool_lookup() {
    let registry = builtin_registry(seeded_storage());
    let err = registry.get("delete_everything").err().unwrap();
    assert!(matches!(err, McpError::UnknownTool(ref n) if n == "delete_everything"));
}
