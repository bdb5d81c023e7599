use ragfuse_core::SearchResult;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

struct CacheEntry {
    results: Vec<SearchResult>,
    created_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn is_valid(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) < self.ttl
    }
}

/// Entry counts reported by [`QueryCache::stats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// All stored entries, valid or not.
    pub total_entries: usize,
    /// Entries still within their TTL.
    pub valid_entries: usize,
    /// Entries past their TTL that have not been evicted yet.
    pub expired_entries: usize,
}

/// Cache of fused result lists keyed by the exact query string.
///
/// Keys are the SHA-256 digest of the query with no normalization, so
/// `"Rust"` and `"rust"` are different entries. An entry is valid while
/// `now - created_at < ttl`; expired entries are removed when looked up.
pub struct QueryCache {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl QueryCache {
    /// Create an empty cache whose entries live for `default_ttl` unless
    /// [`put`](Self::put) says otherwise.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            default_ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// TTL applied when `put` is called without one.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Hex SHA-256 of the query text.
    pub fn cache_key(query: &str) -> String {
        hex::encode(Sha256::digest(query.as_bytes()))
    }

    /// Cached results for `query`, if present and unexpired.
    pub async fn get(&self, query: &str) -> Option<Vec<SearchResult>> {
        let key = Self::cache_key(query);
        let mut entries = self.entries.lock().await;

        let valid = entries.get(&key)?.is_valid(Instant::now());
        if valid {
            debug!(key = %key, "Cache hit");
            entries.get(&key).map(|e| e.results.clone())
        } else {
            entries.remove(&key);
            debug!(key = %key, "Cache entry expired");
            None
        }
    }

    /// Store `results` for `query`, replacing any previous entry.
    pub async fn put(&self, query: &str, results: Vec<SearchResult>, ttl: Option<Duration>) {
        let key = Self::cache_key(query);
        let entry = CacheEntry {
            results,
            created_at: Instant::now(),
            ttl: ttl.unwrap_or(self.default_ttl),
        };
        self.entries.lock().await.insert(key, entry);
    }

    /// Drop every entry, returning how many were removed.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let count = entries.len();
        entries.clear();
        count
    }

    /// Count entries by validity without evicting anything.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        let valid_entries = entries.values().filter(|e| e.is_valid(now)).count();
        CacheStats {
            total_entries: entries.len(),
            valid_entries,
            expired_entries: entries.len() - valid_entries,
        }
    }
}
