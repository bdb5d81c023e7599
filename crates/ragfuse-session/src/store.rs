use crate::session::{Session, SessionStats};
use async_trait::async_trait;
use chrono::Utc;
use ragfuse_core::{RagfuseError, RagfuseResult};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Storage for caller sessions. Implementations must tolerate concurrent callers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Start a fresh session under `id`, replacing any existing one.
    async fn create_session(&self, id: &str) -> RagfuseResult<Session>;

    /// Look up a session and mark it as accessed.
    async fn get_session(&self, id: &str) -> RagfuseResult<Option<Session>>;

    /// Append a query to the session's history, creating the session if needed.
    async fn add_query(&self, id: &str, query: &str, summary: &str) -> RagfuseResult<()>;

    /// Register a document with the session, creating it if needed.
    /// Returns `false` if the document was already registered.
    async fn add_document(&self, id: &str, document: &str) -> RagfuseResult<bool>;

    /// Count a cache hit against the session, creating it if needed.
    async fn record_cache_hit(&self, id: &str) -> RagfuseResult<()>;

    /// Remove a session. Returns whether it existed.
    async fn clear_session(&self, id: &str) -> RagfuseResult<bool>;

    /// Remove sessions not accessed within `max_age`. Returns how many were removed.
    async fn clear_expired(&self, max_age: Duration) -> RagfuseResult<usize>;

    /// Ids of every stored session, sorted.
    async fn list_sessions(&self) -> RagfuseResult<Vec<String>>;

    /// Counters for one session; `None` if it does not exist.
    async fn session_stats(&self, id: &str) -> RagfuseResult<Option<SessionStats>>;
}

/// Process-local session store.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_id(id: &str) -> RagfuseResult<()> {
    if id.is_empty() {
        return Err(RagfuseError::Session("Session id must not be empty".to_string()));
    }
    Ok(())
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, id: &str) -> RagfuseResult<Session> {
        check_id(id)?;
        let session = Session::new(id);
        self.sessions
            .write()
            .await
            .insert(id.to_string(), session.clone());
        info!(session_id = %id, "Session created");
        Ok(session)
    }

    async fn get_session(&self, id: &str) -> RagfuseResult<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        Ok(sessions.get_mut(id).map(|session| {
            session.touch();
            session.clone()
        }))
    }

    async fn add_query(&self, id: &str, query: &str, summary: &str) -> RagfuseResult<()> {
        check_id(id)?;
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id));
        session.add_query(query, summary);
        debug!(session_id = %id, total_queries = session.total_queries, "Query recorded");
        Ok(())
    }

    async fn add_document(&self, id: &str, document: &str) -> RagfuseResult<bool> {
        check_id(id)?;
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id));
        Ok(session.add_document(document))
    }

    async fn record_cache_hit(&self, id: &str) -> RagfuseResult<()> {
        check_id(id)?;
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::new(id))
            .record_cache_hit();
        Ok(())
    }

    async fn clear_session(&self, id: &str) -> RagfuseResult<bool> {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            info!(session_id = %id, "Session cleared");
        }
        Ok(removed)
    }

    async fn clear_expired(&self, max_age: Duration) -> RagfuseResult<usize> {
        // Ages beyond chrono's range can never be exceeded.
        let Ok(max_age) = chrono::Duration::from_std(max_age) else {
            return Ok(0);
        };
        let now = Utc::now();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_accessed <= max_age);
        let removed = before - sessions.len();

        if removed > 0 {
            info!(removed, remaining = sessions.len(), "Expired sessions cleared");
        }
        Ok(removed)
    }

    async fn list_sessions(&self) -> RagfuseResult<Vec<String>> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }

    async fn session_stats(&self, id: &str) -> RagfuseResult<Option<SessionStats>> {
        Ok(self.sessions.read().await.get(id).map(Session::stats))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_query_creates_session_lazily() {
        let store = InMemorySessionStore::new();
        store.add_query("new", "what is rust", "2 results").await.unwrap();

        let session = store.get_session("new").await.unwrap().unwrap();
        assert_eq!(session.total_queries, 1);
        assert_eq!(session.queries[0].query, "what is rust");
    }

    #[tokio::test]
    async fn test_total_queries_is_monotonic() {
        let store = InMemorySessionStore::new();
        let mut last = 0;
        for i in 0..5 {
            store.add_query("s", &format!("q{i}"), "ok").await.unwrap();
            let total = store.session_stats("s").await.unwrap().unwrap().total_queries;
            assert!(total > last);
            last = total;
        }
        assert_eq!(last, 5);
    }

    #[tokio::test]
    async fn test_get_session_touches_last_accessed() {
        let store = InMemorySessionStore::new();
        let created = store.create_session("s").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let fetched = store.get_session("s").await.unwrap().unwrap();
        assert!(fetched.last_accessed > created.last_accessed);
    }

    #[tokio::test]
    async fn test_unknown_session_is_none() {
        let store = InMemorySessionStore::new();
        assert!(store.get_session("missing").await.unwrap().is_none());
        assert!(store.session_stats("missing").await.unwrap().is_none());
        assert!(!store.clear_session("missing").await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_id_rejected() {
        let store = InMemorySessionStore::new();
        let err = store.add_query("", "q", "s").await.unwrap_err();
        assert!(matches!(err, RagfuseError::Session(_)));
    }

    #[tokio::test]
    async fn test_clear_expired_keeps_recent() {
        let store = InMemorySessionStore::new();
        store.create_session("old").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        store.create_session("fresh").await.unwrap();

        let removed = store.clear_expired(Duration::from_millis(25)).await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(store.list_sessions().await.unwrap(), vec!["fresh".to_string()]);
    }

    #[tokio::test]
    async fn test_clear_expired_huge_age_removes_nothing() {
        let store = InMemorySessionStore::new();
        store.create_session("s").await.unwrap();
        assert_eq!(store.clear_expired(Duration::MAX).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cache_hits_and_documents_counted() {
        let store = InMemorySessionStore::new();
        assert!(store.add_document("s", "paper.pdf").await.unwrap());
        assert!(!store.add_document("s", "paper.pdf").await.unwrap());
        store.record_cache_hit("s").await.unwrap();

        let stats = store.session_stats("s").await.unwrap().unwrap();
        assert_eq!(stats.documents_uploaded, 1);
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.total_queries, 0);
    }
}
