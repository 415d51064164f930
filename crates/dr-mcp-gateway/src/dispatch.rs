//! Transport-facing entry point: authenticate, route to a session, delegate.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::auth::AuthGate;
use crate::session::SessionStore;
use crate::types::{Call, CallKind, McpError, McpResult, Reply};

/// Outcome of one dispatched call, before a transport renders it.
#[derive(Debug)]
pub struct Dispatched {
    /// Session the call ran against. Stamped into the response.
    pub session_id: Option<String>,
    /// Engine result.
    pub result: McpResult<Value>,
}

impl Dispatched {
    fn rejected(err: McpError) -> Self {
        Self {
            session_id: None,
            result: Err(err),
        }
    }

    /// Render as the native reply envelope.
    pub fn into_reply(self) -> Reply {
        Reply::from_result(self.session_id, &self.result)
    }
}

/// Authenticates calls and routes them to per-session engines.
pub struct Dispatcher {
    auth: AuthGate,
    store: Arc<SessionStore>,
}

impl Dispatcher {
    /// Build a dispatcher over a gate and a store.
    pub fn new(auth: AuthGate, store: Arc<SessionStore>) -> Self {
        Self { auth, store }
    }

    /// The session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Check a credential without touching any session.
    pub fn authenticate(&self, authorization: Option<&str>) -> McpResult<()> {
        self.auth.check(authorization)
    }

    /// Handle one call.
    ///
    /// `initialize`, or any call without a session id, opens a new session.
    /// Anything else must name a live session.
    pub async fn dispatch(&self, authorization: Option<&str>, call: Call) -> Dispatched {
        if let Err(err) = self.auth.check(authorization) {
            return Dispatched::rejected(err);
        }

        let kind = call.kind();
        if kind == CallKind::Terminate {
            return self.close(call.session_id.as_deref()).await;
        }
        if kind == CallKind::Empty {
            return Dispatched::rejected(McpError::InvalidRequest(
                "call names neither a method nor a tool".to_string(),
            ));
        }
        if let CallKind::Other(method) = kind {
            // Unsupported methods never open or touch a session.
            return Dispatched::rejected(McpError::MethodNotFound(method.to_string()));
        }

        let session = match call.session_id.as_deref() {
            Some(id) if kind != CallKind::Initialize => match self.store.resolve(id).await {
                Ok(session) => session,
                Err(err) => {
                    tracing::debug!("Rejected call for unknown session {id}");
                    return Dispatched::rejected(err);
                }
            },
            _ => self.store.create().await,
        };

        session.touch();
        tracing::debug!(session = session.id(), ?kind, "Dispatching call");
        let initializing = kind == CallKind::Initialize;
        let result = session.engine().handle(call).await;

        // A session whose handshake failed can never become active.
        if initializing && result.is_err() {
            self.store.close(session.id()).await;
            return Dispatched {
                session_id: None,
                result,
            };
        }

        Dispatched {
            session_id: Some(session.id().to_string()),
            result,
        }
    }

    /// Close a session. Always succeeds once authenticated, even for ids
    /// that were never issued.
    pub async fn terminate(
        &self,
        authorization: Option<&str>,
        session_id: Option<&str>,
    ) -> Dispatched {
        if let Err(err) = self.auth.check(authorization) {
            return Dispatched::rejected(err);
        }
        self.close(session_id).await
    }

    async fn close(&self, session_id: Option<&str>) -> Dispatched {
        if let Some(id) = session_id {
            self.store.close(id).await;
        }
        // A closed id is never stamped back: it can no longer be echoed.
        Dispatched {
            session_id: None,
            result: Ok(json!({ "terminated": true })),
        }
    }
}
