#![deny(missing_docs)]
//! Durable conversation storage: sessions and their append-only message
//! logs (spec §3, §4.2). Grounded in the Python prototype's
//! `ConversationStorage` (sessions/messages tables, `add_message`,
//! `get_recent_sessions`, `delete_old_sessions`) and shaped as a trait
//! with a default in-memory implementation, so a durable backend can
//! replace it without touching the engine.

mod error;

pub use error::StoreError;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use paathshala_types::{Message, Role, Session, SessionId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// CRUD and retention operations over sessions and their messages.
///
/// One trait covers both directions: it's the read-write surface the
/// engine's Finalize stage writes through, and the same trait serves
/// LoadContext's reads. A single trait is enough here because every
/// caller in this system is the engine itself.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Create a new session, or return the existing one if `session_id`
    /// is already known. Idempotent so LoadContext can call it
    /// unconditionally on every request.
    async fn get_or_create_session(&self, session_id: &SessionId) -> Result<Session, StoreError>;

    /// Fetch a session's metadata without its messages.
    async fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Append a message to a session's log, assigning the next
    /// monotonic sequence number. Errors if the session doesn't exist.
    async fn append_message(
        &self,
        session_id: &SessionId,
        role: Role,
        content: String,
        metadata: serde_json::Value,
    ) -> Result<Message, StoreError>;

    /// Replace a session's entire message log. The only mutation that
    /// isn't a plain append; summarization never calls this; it
    /// compacts the hot-cache view only, leaving the durable log intact
    /// (spec §4.2).
    async fn replace_messages(
        &self,
        session_id: &SessionId,
        messages: Vec<Message>,
    ) -> Result<(), StoreError>;

    /// Fetch messages for a session in sequence order, optionally
    /// capped to the most recent `limit`.
    async fn get_messages(
        &self,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, StoreError>;

    /// Number of messages stored for a session.
    async fn get_message_count(&self, session_id: &SessionId) -> Result<u64, StoreError>;

    /// Delete a session and its messages. No-op if it doesn't exist.
    async fn delete_session(&self, session_id: &SessionId) -> Result<(), StoreError>;

    /// The `limit` most recently updated sessions, newest first.
    async fn recent_sessions(&self, limit: usize) -> Result<Vec<Session>, StoreError>;

    /// Delete every session last updated before `cutoff`. Returns the
    /// number of sessions removed. The engine calls this from an
    /// on-demand retention sweep, not a background timer (spec §6).
    async fn delete_sessions_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

struct SessionRecord {
    session: Session,
    messages: Vec<Message>,
}

/// In-memory `ConversationStore`. Suitable for a single-process
/// deployment or tests; a durable backend (sqlite, postgres) would
/// implement the same trait without the engine noticing the difference.
pub struct InMemoryConversationStore {
    sessions: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemoryConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversationStore for InMemoryConversationStore {
    async fn get_or_create_session(&self, session_id: &SessionId) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write().await;
        if let Some(record) = sessions.get(session_id.as_str()) {
            return Ok(record.session.clone());
        }
        let now = Utc::now();
        let session = Session::new(session_id.clone(), now);
        sessions.insert(
            session_id.as_str().to_string(),
            SessionRecord {
                session: session.clone(),
                messages: Vec::new(),
            },
        );
        tracing::debug!(session_id = %session_id, "created session");
        Ok(session)
    }

    async fn get_session(&self, session_id: &SessionId) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(session_id.as_str()).map(|r| r.session.clone()))
    }

    async fn append_message(
        &self,
        session_id: &SessionId,
        role: Role,
        content: String,
        metadata: serde_json::Value,
    ) -> Result<Message, StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(session_id.as_str())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;

        let sequence = record.messages.len() as u64 + 1;
        let now = Utc::now();
        let message = Message {
            session_id: session_id.clone(),
            monotonic_sequence: sequence,
            role,
            content,
            capture_time: now,
            metadata,
        };
        record.messages.push(message.clone());
        record.session.updated_at = now;
        Ok(message)
    }

    async fn replace_messages(
        &self,
        session_id: &SessionId,
        messages: Vec<Message>,
    ) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        let record = sessions
            .get_mut(session_id.as_str())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        record.messages = messages;
        record.session.updated_at = Utc::now();
        Ok(())
    }

    async fn get_messages(
        &self,
        session_id: &SessionId,
        limit: Option<usize>,
    ) -> Result<Vec<Message>, StoreError> {
        let sessions = self.sessions.read().await;
        let record = sessions
            .get(session_id.as_str())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        match limit {
            Some(n) if n < record.messages.len() => {
                Ok(record.messages[record.messages.len() - n..].to_vec())
            }
            _ => Ok(record.messages.clone()),
        }
    }

    async fn get_message_count(&self, session_id: &SessionId) -> Result<u64, StoreError> {
        let sessions = self.sessions.read().await;
        let record = sessions
            .get(session_id.as_str())
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
        Ok(record.messages.len() as u64)
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(session_id.as_str());
        Ok(())
    }

    async fn recent_sessions(&self, limit: usize) -> Result<Vec<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        let mut all: Vec<Session> = sessions.values().map(|r| r.session.clone()).collect();
        all.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        all.truncate(limit);
        Ok(all)
    }

    async fn delete_sessions_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, record| record.session.updated_at >= cutoff);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = InMemoryConversationStore::new();
        let id = SessionId::new("s1");
        let a = store.get_or_create_session(&id).await.unwrap();
        let b = store.get_or_create_session(&id).await.unwrap();
        assert_eq!(a.created_at, b.created_at);
    }

    #[tokio::test]
    async fn append_message_assigns_contiguous_sequence() {
        let store = InMemoryConversationStore::new();
        let id = SessionId::new("s1");
        store.get_or_create_session(&id).await.unwrap();

        let m1 = store
            .append_message(&id, Role::User, "hello".into(), json!({}))
            .await
            .unwrap();
        let m2 = store
            .append_message(&id, Role::Assistant, "hi".into(), json!({}))
            .await
            .unwrap();

        assert_eq!(m1.monotonic_sequence, 1);
        assert_eq!(m2.monotonic_sequence, 2);
    }

    #[tokio::test]
    async fn append_message_without_session_fails() {
        let store = InMemoryConversationStore::new();
        let id = SessionId::new("missing");
        let result = store
            .append_message(&id, Role::User, "hi".into(), json!({}))
            .await;
        assert!(matches!(result, Err(StoreError::SessionNotFound(_))));
    }

    #[tokio::test]
    async fn get_messages_respects_limit() {
        let store = InMemoryConversationStore::new();
        let id = SessionId::new("s1");
        store.get_or_create_session(&id).await.unwrap();
        for i in 0..5 {
            store
                .append_message(&id, Role::User, format!("msg{i}"), json!({}))
                .await
                .unwrap();
        }
        let recent = store.get_messages(&id, Some(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content, "msg3");
        assert_eq!(recent[1].content, "msg4");
    }

    #[tokio::test]
    async fn replace_messages_overwrites_the_full_log() {
        let store = InMemoryConversationStore::new();
        let id = SessionId::new("s1");
        store.get_or_create_session(&id).await.unwrap();
        store
            .append_message(&id, Role::User, "one".into(), json!({}))
            .await
            .unwrap();
        store
            .append_message(&id, Role::User, "two".into(), json!({}))
            .await
            .unwrap();

        let summary = Message {
            session_id: id.clone(),
            monotonic_sequence: 1,
            role: Role::System,
            content: "[summary] one, two".into(),
            capture_time: Utc::now(),
            metadata: json!({}),
        };
        store
            .replace_messages(&id, vec![summary])
            .await
            .unwrap();

        assert_eq!(store.get_message_count(&id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_sessions_older_than_cutoff_removes_stale_sessions() {
        let store = InMemoryConversationStore::new();
        let old_id = SessionId::new("old");
        let fresh_id = SessionId::new("fresh");
        store.get_or_create_session(&old_id).await.unwrap();
        store.get_or_create_session(&fresh_id).await.unwrap();

        {
            let mut sessions = store.sessions.write().await;
            sessions.get_mut("old").unwrap().session.updated_at =
                Utc::now() - Duration::hours(100);
        }

        let removed = store
            .delete_sessions_older_than(Utc::now() - Duration::hours(24))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_session(&old_id).await.unwrap().is_none());
        assert!(store.get_session(&fresh_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn recent_sessions_orders_newest_first() {
        let store = InMemoryConversationStore::new();
        let a = SessionId::new("a");
        let b = SessionId::new("b");
        store.get_or_create_session(&a).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        store.get_or_create_session(&b).await.unwrap();

        let recent = store.recent_sessions(10).await.unwrap();
        assert_eq!(recent[0].id.as_str(), "b");
        assert_eq!(recent[1].id.as_str(), "a");
    }
}
