use super::config::ConnectionId;
use super::session::TranslationSession;
use super::stats::SessionStats;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::info;

pub type SessionHandle = Arc<Mutex<TranslationSession>>;

/// Live translation sessions, at most one per connection
///
/// Map mutations are atomic; stopping a displaced or removed session happens
/// after the map lock is released.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<ConnectionId, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `session`, stopping any session it replaces
    pub async fn register(&self, connection_id: ConnectionId, session: TranslationSession) -> SessionHandle {
        let handle = Arc::new(Mutex::new(session));

        let previous = {
            let mut sessions = self.sessions.write().await;
            sessions.insert(connection_id.clone(), Arc::clone(&handle))
        };

        if let Some(previous) = previous {
            info!("[{}] Replacing existing translation session", connection_id);
            previous.lock().await.stop().await;
        }

        handle
    }

    pub async fn get(&self, connection_id: &ConnectionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(connection_id).cloned()
    }

    /// Stop and drop the session for `connection_id`; no-op if there is none
    pub async fn remove(&self, connection_id: &ConnectionId) -> bool {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(connection_id)
        };

        match removed {
            Some(session) => {
                session.lock().await.stop().await;
                info!("[{}] Translation session removed", connection_id);
                true
            }
            None => false,
        }
    }

    pub async fn contains(&self, connection_id: &ConnectionId) -> bool {
        self.sessions.read().await.contains_key(connection_id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    pub async fn ids(&self) -> Vec<ConnectionId> {
        let sessions = self.sessions.read().await;
        sessions.keys().cloned().collect()
    }

    pub async fn stats(&self, connection_id: &ConnectionId) -> Option<SessionStats> {
        let session = self.get(connection_id).await?;
        let session = session.lock().await;
        let stats = session.get_stats().await;
        Some(stats)
    }
}
