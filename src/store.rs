use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::session::{GameSession, SessionId};

/// Where the coordinator keeps its running sessions. Abstracted so a
/// process-external backend can be plugged in without touching the
/// coordinator.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn exists(&self, id: SessionId) -> bool;
    /// Registers a session. Returns `false` when the id is already taken.
    async fn add(&self, session: Arc<GameSession>) -> bool;
    async fn get(&self, id: SessionId) -> Option<Arc<GameSession>>;
    async fn list_all(&self) -> Vec<Arc<GameSession>>;
    /// Returns `false` when no session with that id was stored.
    async fn remove(&self, id: SessionId) -> bool;
}

/// The default process-local store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Arc<GameSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn exists(&self, id: SessionId) -> bool {
        self.sessions.lock().await.contains_key(&id)
    }

    async fn add(&self, session: Arc<GameSession>) -> bool {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&session.id()) {
            return false;
        }
        sessions.insert(session.id(), session);
        true
    }

    async fn get(&self, id: SessionId) -> Option<Arc<GameSession>> {
        self.sessions.lock().await.get(&id).cloned()
    }

    async fn list_all(&self) -> Vec<Arc<GameSession>> {
        self.sessions.lock().await.values().cloned().collect()
    }

    async fn remove(&self, id: SessionId) -> bool {
        self.sessions.lock().await.remove(&id).is_some()
    }
}
