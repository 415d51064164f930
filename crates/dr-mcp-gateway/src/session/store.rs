//! Live sessions keyed by server-issued identifier.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::protocol::ProtocolEngine;
use crate::tools::ToolRegistry;
use crate::types::{McpError, McpResult};

/// One live session and the engine it owns.
pub struct Session {
    id: String,
    created_at: DateTime<Utc>,
    last_active_ms: AtomicI64,
    closed: AtomicBool,
    engine: ProtocolEngine,
}

impl Session {
    fn new(id: String, engine: ProtocolEngine) -> Self {
        let created_at = Utc::now();
        Self {
            id,
            created_at,
            last_active_ms: AtomicI64::new(created_at.timestamp_millis()),
            closed: AtomicBool::new(false),
            engine,
        }
    }

    /// Session identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// When the session was created.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// The session's protocol engine.
    pub fn engine(&self) -> &ProtocolEngine {
        &self.engine
    }

    /// Whether the session has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Record activity now.
    pub fn touch(&self) {
        self.last_active_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Time since the last recorded activity.
    pub fn idle_for(&self) -> Duration {
        let idle_ms = Utc::now().timestamp_millis() - self.last_active_ms.load(Ordering::Relaxed);
        Duration::from_millis(u64::try_from(idle_ms).unwrap_or(0))
    }

    fn mark_closed(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("closed", &self.is_closed())
            .field("engine", &self.engine)
            .finish()
    }
}

/// Owns every live session. Safe for concurrent create/resolve/close.
pub struct SessionStore {
    registry: Arc<ToolRegistry>,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionStore {
    /// Empty store whose engines share `registry`.
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// The tool catalog engines are built over.
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Open a session under a fresh random identifier.
    pub async fn create(&self) -> Arc<Session> {
        let mut sessions = self.sessions.write().await;
        let id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };

        let session = Arc::new(Session::new(
            id.clone(),
            ProtocolEngine::new(Arc::clone(&self.registry)),
        ));
        sessions.insert(id, Arc::clone(&session));
        tracing::info!("Session {} created ({} live)", session.id(), sessions.len());
        session
    }

    /// Look up a live session.
    pub async fn resolve(&self, id: &str) -> McpResult<Arc<Session>> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| McpError::SessionNotFound(id.to_string()))
    }

    /// Close a session. Unknown or already-closed ids are a no-op.
    ///
    /// Returns whether a live session was removed.
    pub async fn close(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id);
        match removed {
            Some(session) => {
                session.mark_closed();
                tracing::info!("Session {id} closed");
                true
            }
            None => {
                tracing::debug!("Close of unknown session {id} ignored");
                false
            }
        }
    }

    /// Close every session idle longer than `max_idle`.
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| {
            let keep = session.idle_for() <= max_idle;
            if !keep {
                session.mark_closed();
                tracing::debug!("Session {} expired after idling", session.id());
            }
            keep
        });
        before - sessions.len()
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Whether no session is live.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::EngineState;

    fn store() -> SessionStore {
        SessionStore::new(Arc::new(ToolRegistry::new()))
    }

    #[tokio::test]
    async fn create_then_resolve_returns_same_session() {
        let store = store();
        let opened_after = Utc::now();
        let session = store.create().await;
        assert!(session.created_at() >= opened_after);
        assert!(session.created_at() <= Utc::now());
        let resolved = store.resolve(session.id()).await.unwrap();
        assert!(Arc::ptr_eq(&session, &resolved));
        assert_eq!(resolved.engine().state(), EngineState::Uninitialized);
        assert_eq!(Uuid::parse_str(session.id()).unwrap().get_version_num(), 4);
    }

    #[tokio::test]
    async fn close_is_terminal_and_idempotent() {
        let store = store();
        let session = store.create().await;
        let id = session.id().to_string();

        assert!(store.close(&id).await);
        assert!(session.is_closed());
        assert!(!store.close(&id).await);
        assert!(!store.close("never-issued").await);

        let err = store.resolve(&id).await.unwrap_err();
        assert!(matches!(err, McpError::SessionNotFound(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sweep_keeps_recently_active_sessions() {
        let store = store();
        let stale = store.create().await;
        let fresh = store.create().await;
        stale
            .last_active_ms
            .store(Utc::now().timestamp_millis() - 60_000, Ordering::Relaxed);
        fresh.touch();

        let closed = store.sweep_idle(Duration::from_secs(30)).await;
        assert_eq!(closed, 1);
        assert!(stale.is_closed());
        assert!(store.resolve(stale.id()).await.is_err());
        assert!(store.resolve(fresh.id()).await.is_ok());
    }
}
