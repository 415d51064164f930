//! HTTP transport: native `/call` envelope, MCP `/mcp` and a health check.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use dr_records::Storage;

use crate::dispatch::Dispatcher;
use crate::types::{Call, ErrorKind, McpError, McpResult, Reply, SERVER_VERSION};

use super::jsonrpc::{self, RpcOutcome};

/// Session identifier header, both directions.
pub const SESSION_HEADER: &str = "mcp-session-id";

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    /// Call router.
    pub dispatcher: Arc<Dispatcher>,
    /// Storage, pinged by `/health`.
    pub storage: Arc<dyn Storage>,
}

impl AppState {
    /// Bundle a dispatcher and the storage it reads through.
    pub fn new(dispatcher: Arc<Dispatcher>, storage: Arc<dyn Storage>) -> Self {
        Self {
            dispatcher,
            storage,
        }
    }
}

/// HTTP status for a failed call.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::SessionNotFound | ErrorKind::UnknownTool => StatusCode::NOT_FOUND,
        ErrorKind::ProtocolState => StatusCode::CONFLICT,
        ErrorKind::ArgumentValidation | ErrorKind::InvalidRequest | ErrorKind::MethodNotFound => {
            StatusCode::BAD_REQUEST
        }
        ErrorKind::Storage | ErrorKind::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Build the router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/call", post(handle_call))
        .route(
            "/mcp",
            post(handle_mcp_post)
                .delete(handle_mcp_delete)
                .get(handle_mcp_get),
        )
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(addr: &str, state: AppState) -> McpResult<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(McpError::Io)?;

    tracing::info!("HTTP transport listening on {addr}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| McpError::Transport(e.to_string()))?;

    tracing::info!("HTTP transport stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

fn with_session_header(mut response: Response, session_id: Option<&str>) -> Response {
    if let Some(value) = session_id.and_then(|id| HeaderValue::from_str(id).ok()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(SESSION_HEADER), value);
    }
    response
}

async fn handle_call(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let authorization = header_str(&headers, header::AUTHORIZATION.as_str());

    let mut call: Call = match serde_json::from_slice(&body) {
        Ok(call) => call,
        Err(e) => {
            let err = state
                .dispatcher
                .authenticate(authorization)
                .err()
                .unwrap_or_else(|| McpError::InvalidRequest(e.to_string()));
            return (status_for(err.kind()), Json(Reply::failure(None, &err))).into_response();
        }
    };

    if call.session_id.is_none() {
        call.session_id = header_str(&headers, SESSION_HEADER).map(str::to_string);
    }

    let dispatched = state.dispatcher.dispatch(authorization, call).await;
    let status = match &dispatched.result {
        Ok(_) => StatusCode::OK,
        Err(err) => status_for(err.kind()),
    };
    let reply = dispatched.into_reply();
    let session_id = reply.session_id.clone();
    with_session_header((status, Json(reply)).into_response(), session_id.as_deref())
}

async fn handle_mcp_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let outcome = jsonrpc::handle_body(
        &state.dispatcher,
        header_str(&headers, header::AUTHORIZATION.as_str()),
        header_str(&headers, SESSION_HEADER),
        &body,
    )
    .await;

    match outcome {
        RpcOutcome::Accepted => StatusCode::ACCEPTED.into_response(),
        RpcOutcome::Respond {
            session_id,
            unauthenticated,
            body,
        } => {
            let status = if unauthenticated {
                StatusCode::UNAUTHORIZED
            } else {
                StatusCode::OK
            };
            with_session_header((status, Json(body)).into_response(), session_id.as_deref())
        }
    }
}

async fn handle_mcp_delete(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let dispatched = state
        .dispatcher
        .terminate(
            header_str(&headers, header::AUTHORIZATION.as_str()),
            header_str(&headers, SESSION_HEADER),
        )
        .await;

    match dispatched.result {
        Ok(_) => Json(json!({ "ok": true })).into_response(),
        Err(err) => (status_for(err.kind()), Json(Reply::failure(None, &err))).into_response(),
    }
}

async fn handle_mcp_get() -> Json<serde_json::Value> {
    Json(json!({
        "ok": true,
        "message": "MCP endpoint is live. Use POST /mcp for MCP calls."
    }))
}

async fn handle_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let storage = Arc::clone(&state.storage);
    let reachable = matches!(
        tokio::task::spawn_blocking(move || storage.ping()).await,
        Ok(Ok(()))
    );
    if !reachable {
        tracing::warn!("Health check: storage unreachable");
    }

    Json(json!({
        "ok": true,
        "storage": if reachable { "ok" } else { "unreachable" },
        "sessions": state.dispatcher.store().len().await,
        "version": SERVER_VERSION,
    }))
}
