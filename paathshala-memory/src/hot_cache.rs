//! Bounded in-process cache of recently touched sessions' messages.
//!
//! Uses `tokio::sync::Mutex` rather than `RwLock`: an LRU touches its
//! internal ordering on every read, so even a "read" needs exclusive
//! access.

use lru::LruCache;
use paathshala_types::{Message, SessionId};
use std::num::NonZeroUsize;
use tokio::sync::Mutex;

/// An LRU cache of per-session message vectors, sitting in front of the
/// durable [`paathshala_state::ConversationStore`] (spec §4.2).
pub struct HotCache {
    inner: Mutex<LruCache<String, Vec<Message>>>,
}

impl HotCache {
    /// Create a cache holding at most `capacity` sessions.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fetch a session's cached messages, if present. Promotes the
    /// entry to most-recently-used.
    pub async fn get(&self, session_id: &SessionId) -> Option<Vec<Message>> {
        let mut cache = self.inner.lock().await;
        cache.get(session_id.as_str()).cloned()
    }

    /// Insert or replace a session's cached messages.
    pub async fn put(&self, session_id: &SessionId, messages: Vec<Message>) {
        let mut cache = self.inner.lock().await;
        cache.put(session_id.as_str().to_string(), messages);
    }

    /// Drop a session's cached entry, e.g. after the durable store's
    /// copy changed underneath it (summarization, deletion).
    pub async fn invalidate(&self, session_id: &SessionId) {
        let mut cache = self.inner.lock().await;
        cache.pop(session_id.as_str());
    }

    /// Number of sessions currently cached.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paathshala_types::Role;
    use serde_json::json;

    fn message(session_id: &SessionId, seq: u64) -> Message {
        Message {
            session_id: session_id.clone(),
            monotonic_sequence: seq,
            role: Role::User,
            content: format!("msg{seq}"),
            capture_time: Utc::now(),
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn put_then_get_roundtrips() {
        let cache = HotCache::new(2);
        let id = SessionId::new("s1");
        cache.put(&id, vec![message(&id, 1)]).await;
        let got = cache.get(&id).await.unwrap();
        assert_eq!(got.len(), 1);
    }

    #[tokio::test]
    async fn evicts_least_recently_used_beyond_capacity() {
        let cache = HotCache::new(1);
        let a = SessionId::new("a");
        let b = SessionId::new("b");
        cache.put(&a, vec![message(&a, 1)]).await;
        cache.put(&b, vec![message(&b, 1)]).await;

        assert!(cache.get(&a).await.is_none());
        assert!(cache.get(&b).await.is_some());
    }

    #[tokio::test]
    async fn invalidate_removes_entry() {
        let cache = HotCache::new(2);
        let id = SessionId::new("s1");
        cache.put(&id, vec![message(&id, 1)]).await;
        cache.invalidate(&id).await;
        assert!(cache.get(&id).await.is_none());
    }
}
