//! Periodic idle-session sweeping background task.

use std::sync::Arc;
use std::time::Duration;

use super::store::SessionStore;

/// Spawn a background task that closes sessions idle longer than `max_idle`.
pub fn spawn_idle_sweeper(
    store: Arc<SessionStore>,
    max_idle: Duration,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let closed = store.sweep_idle(max_idle).await;
            if closed > 0 {
                tracing::info!("Idle sweep closed {closed} session(s)");
            }
        }
    })
}
