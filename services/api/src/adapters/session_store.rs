//! services/api/src/adapters/session_store.rs
//!
//! Server-side session storage held in process memory.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use parts_finder_core::domain::Session;
use parts_finder_core::ports::{PortResult, SessionStore};
use uuid::Uuid;

/// A concurrent in-memory `SessionStore`. Sessions do not survive a restart.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<Uuid, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert(&self, session: Session) -> PortResult<()> {
        self.sessions.insert(session.id, session);
        Ok(())
    }

    async fn get(&self, session_id: Uuid) -> PortResult<Option<Session>> {
        Ok(self.sessions.get(&session_id).map(|entry| entry.value().clone()))
    }

    async fn remove(&self, session_id: Uuid) -> PortResult<()> {
        self.sessions.remove(&session_id);
        Ok(())
    }

    async fn remove_expired(&self, now: DateTime<Utc>, lifetime: Duration) -> PortResult<usize> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired_at(now, lifetime));
        Ok(before.saturating_sub(self.sessions.len()))
    }
}
