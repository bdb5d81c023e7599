use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One served query in a session's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    /// The query text as received.
    pub query: String,
    /// Short description of what was returned.
    pub summary: String,
    /// When the query was recorded.
    pub timestamp: DateTime<Utc>,
}

/// Query history and registered documents of one caller session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Caller-chosen session id.
    pub id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last read or write through the store.
    pub last_accessed: DateTime<Utc>,
    /// Served queries, oldest first.
    pub queries: Vec<QueryRecord>,
    /// Registered document identifiers in first-seen order.
    pub documents: Vec<String>,
    /// Queries recorded, cache hits included.
    pub total_queries: usize,
    /// Queries answered from the query cache.
    pub cache_hits: usize,
}

impl Session {
    /// Start an empty session.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created_at: now,
            last_accessed: now,
            queries: Vec::new(),
            documents: Vec::new(),
            total_queries: 0,
            cache_hits: 0,
        }
    }

    /// Mark the session as accessed now.
    pub fn touch(&mut self) {
        self.last_accessed = Utc::now();
    }

    /// Append a served query to the history.
    pub fn add_query(&mut self, query: impl Into<String>, summary: impl Into<String>) {
        let now = Utc::now();
        self.queries.push(QueryRecord {
            query: query.into(),
            summary: summary.into(),
            timestamp: now,
        });
        self.total_queries += 1;
        self.last_accessed = now;
    }

    /// Register a document. Returns `false` if it was already registered.
    pub fn add_document(&mut self, document: impl Into<String>) -> bool {
        let document = document.into();
        self.touch();
        if self.documents.contains(&document) {
            return false;
        }
        self.documents.push(document);
        true
    }

    /// Count a query answered from the cache.
    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
        self.touch();
    }

    /// Summary counters for this session.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.id.clone(),
            created_at: self.created_at,
            last_accessed: self.last_accessed,
            total_queries: self.total_queries,
            documents_uploaded: self.documents.len(),
            cache_hits: self.cache_hits,
        }
    }
}

/// Summary counters for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Id of the summarized session.
    pub session_id: String,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// Last access through the store.
    pub last_accessed: DateTime<Utc>,
    /// Queries recorded, cache hits included.
    pub total_queries: usize,
    /// Distinct documents registered.
    pub documents_uploaded: usize,
    /// Queries answered from the query cache.
    pub cache_hits: usize,
}
