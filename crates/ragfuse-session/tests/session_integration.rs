#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use ragfuse_core::{DocumentChunk, SearchResult};
use ragfuse_session::{InMemorySessionStore, QueryCache, SessionStore};

fn result(content: &str) -> SearchResult {
    SearchResult::document(&DocumentChunk::new(content, "doc.txt", 0), 0.5)
}

#[tokio::test]
async fn test_concurrent_queries_on_one_session() {
    let store = Arc::new(InMemorySessionStore::new());
    let mut handles = Vec::new();
    for i in 0..20 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .add_query("shared", &format!("query {i}"), "1 result")
                .await
                .unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let session = store.get_session("shared").await.unwrap().unwrap();
    assert_eq!(session.total_queries, 20);
    assert_eq!(session.queries.len(), 20);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let store = InMemorySessionStore::new();
    store.add_query("a", "q1", "s").await.unwrap();
    store.add_query("b", "q2", "s").await.unwrap();
    store.add_query("b", "q3", "s").await.unwrap();

    assert_eq!(store.list_sessions().await.unwrap(), vec!["a", "b"]);
    assert!(store.clear_session("a").await.unwrap());
    assert_eq!(store.list_sessions().await.unwrap(), vec!["b"]);
    assert_eq!(
        store.session_stats("b").await.unwrap().unwrap().total_queries,
        2
    );
}

#[tokio::test]
async fn test_create_session_resets_history() {
    let store = InMemorySessionStore::new();
    store.add_query("s", "q", "summary").await.unwrap();
    let fresh = store.create_session("s").await.unwrap();
    assert_eq!(fresh.total_queries, 0);
    assert!(store.get_session("s").await.unwrap().unwrap().queries.is_empty());
}

#[tokio::test]
async fn test_cache_shared_across_tasks() {
    let cache = Arc::new(QueryCache::new(Duration::from_secs(60)));
    let writer = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move {
            cache.put("shared query", vec![result("one"), result("two")], None).await;
        })
    };
    writer.await.unwrap();

    let reader = {
        let cache = Arc::clone(&cache);
        tokio::spawn(async move { cache.get("shared query").await })
    };
    let hit = reader.await.unwrap().unwrap();
    assert_eq!(hit.len(), 2);
    assert_eq!(hit[0].content, "one");
}

#[tokio::test]
async fn test_cache_stats_mix_valid_and_expired() {
    let cache = QueryCache::new(Duration::from_secs(60));
    cache.put("long", vec![result("x")], None).await;
    cache.put("instant", vec![result("y")], Some(Duration::ZERO)).await;

    let stats = cache.stats().await;
    assert_eq!(stats.total_entries, 2);
    assert_eq!(stats.valid_entries, 1);
    assert_eq!(stats.expired_entries, 1);

    assert!(cache.get("instant").await.is_none());
    assert_eq!(cache.stats().await.total_entries, 1);
}

#[tokio::test]
async fn test_cache_real_ttl_expiry() {
    let cache = QueryCache::new(Duration::from_secs(3600));
    cache.put("q", vec![result("x")], Some(Duration::from_secs(1))).await;
    assert!(cache.get("q").await.is_some());

    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(cache.get("q").await.is_none());
    assert_eq!(cache.stats().await.total_entries, 0);
}
