use std::collections::HashMap;
use std::sync::Arc;

use ragfuse_core::{
    validate_alpha, ChunkId, DocumentChunk, RagfuseError, RagfuseResult, SearchResult,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::bm25::LexicalIndex;
use crate::vector::VectorSearch;

/// Min-max normalize scores into [0, 1].
///
/// An empty slice stays empty; if every score is equal (including a single
/// score) every output is exactly 1.0.
pub fn min_max_normalize(scores: &[f32]) -> Vec<f32> {
    let Some(first) = scores.first() else {
        return Vec::new();
    };
    let (min, max) = scores
        .iter()
        .fold((*first, *first), |(lo, hi), &s| (lo.min(s), hi.max(s)));

    if max == min {
        return vec![1.0; scores.len()];
    }
    let range = max - min;
    scores.iter().map(|s| ((s - min) / range).clamp(0.0, 1.0)).collect()
}

/// Corpus statistics for the document side of retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentIndexStats {
    /// Chunks held by the lexical index.
    pub total_chunks: usize,
    /// Whether the lexical index has anything to score.
    pub lexical_ready: bool,
    /// Chunks held by the vector index.
    pub vector_chunks: usize,
}

struct Candidate {
    chunk: DocumentChunk,
    dense: f32,
    sparse: f32,
}

/// Document retriever blending dense vector similarity with BM25.
///
/// Both raw score lists are min-max normalized independently, then combined
/// per chunk as `alpha * dense + (1 - alpha) * sparse`:
/// - `alpha = 1.0`: pure vector
/// - `alpha = 0.0`: pure BM25
/// - `alpha = 0.5`: equal blend
pub struct DocumentHybridScorer {
    vector: Arc<dyn VectorSearch>,
    lexical: RwLock<LexicalIndex>,
}

impl DocumentHybridScorer {
    /// Create a scorer over an external vector index and an empty lexical index.
    pub fn new(vector: Arc<dyn VectorSearch>) -> Self {
        Self {
            vector,
            lexical: RwLock::new(LexicalIndex::new()),
        }
    }

    /// Ingest chunks into the vector index, then the lexical index.
    pub async fn add_documents(&self, chunks: Vec<DocumentChunk>) -> RagfuseResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let count = chunks.len();

        self.vector
            .add_documents(&chunks)
            .await
            .map_err(|e| RagfuseError::Search(format!("Failed to add documents: {e}")))?;

        let total = {
            let mut lexical = self.lexical.write().await;
            lexical.add(chunks);
            lexical.len()
        };

        info!(added = count, total, "Documents added to search indexes");
        Ok(())
    }

    /// Retrieve up to `top_k` document results for `query`.
    ///
    /// Vector and lexical searches run concurrently. A vector index failure
    /// is returned as [`RagfuseError::Search`].
    pub async fn hybrid_search(
        &self,
        query: &str,
        top_k: usize,
        alpha: f32,
    ) -> RagfuseResult<Vec<SearchResult>> {
        validate_alpha(alpha).map_err(RagfuseError::Config)?;

        let (dense, sparse) = tokio::join!(self.vector.search(query, top_k), async {
            self.lexical.read().await.score(query, top_k)
        });
        let dense = dense.map_err(|e| match e {
            RagfuseError::Search(_) => e,
            other => RagfuseError::Search(format!("Vector search failed: {other}")),
        })?;

        let dense_scores = min_max_normalize(&dense.iter().map(|(_, s)| *s).collect::<Vec<_>>());
        let sparse_scores = min_max_normalize(&sparse.iter().map(|(_, s)| *s).collect::<Vec<_>>());

        // Insertion order (dense hits first) is the tie-break for equal scores.
        let mut candidates: Vec<Candidate> = Vec::with_capacity(dense.len() + sparse.len());
        let mut positions: HashMap<ChunkId, usize> = HashMap::new();

        for ((chunk, _), score) in dense.into_iter().zip(dense_scores) {
            positions.insert(chunk.id, candidates.len());
            candidates.push(Candidate {
                chunk,
                dense: score,
                sparse: 0.0,
            });
        }

        for ((chunk, _), score) in sparse.into_iter().zip(sparse_scores) {
            if let Some(&pos) = positions.get(&chunk.id) {
                candidates[pos].sparse = score;
            } else {
                positions.insert(chunk.id, candidates.len());
                candidates.push(Candidate {
                    chunk,
                    dense: 0.0,
                    sparse: score,
                });
            }
        }

        let mut results: Vec<SearchResult> = candidates
            .iter()
            .map(|c| {
                let hybrid = alpha * c.dense + (1.0 - alpha) * c.sparse;
                SearchResult::document(&c.chunk, hybrid.clamp(0.0, 1.0))
            })
            .collect();

        results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        results.truncate(top_k);

        debug!(query_len = query.len(), results = results.len(), alpha, "Hybrid document search");
        Ok(results)
    }

    /// Current corpus statistics.
    pub async fn stats(&self) -> RagfuseResult<DocumentIndexStats> {
        let total_chunks = self.lexical.read().await.len();
        let vector_chunks = self.vector.count().await?;
        Ok(DocumentIndexStats {
            total_chunks,
            lexical_ready: total_chunks > 0,
            vector_chunks,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::embedding::LocalEmbedding;
    use crate::vector::InMemoryVectorIndex;
    use async_trait::async_trait;
    use ragfuse_core::SourceType;

    /// Vector index returning a fixed list regardless of the query.
    struct FixedVector {
        hits: Vec<(DocumentChunk, f32)>,
    }

    #[async_trait]
    impl VectorSearch for FixedVector {
        async fn search(&self, _query: &str, top_k: usize) -> RagfuseResult<Vec<(DocumentChunk, f32)>> {
            Ok(self.hits.iter().take(top_k).cloned().collect())
        }
        async fn add_documents(&self, _chunks: &[DocumentChunk]) -> RagfuseResult<()> {
            Ok(())
        }
        async fn count(&self) -> RagfuseResult<usize> {
            Ok(self.hits.len())
        }
    }

    struct BrokenVector;

    #[async_trait]
    impl VectorSearch for BrokenVector {
        async fn search(&self, _query: &str, _top_k: usize) -> RagfuseResult<Vec<(DocumentChunk, f32)>> {
            Err(RagfuseError::Io(std::io::Error::other("index unreachable")))
        }
        async fn add_documents(&self, _chunks: &[DocumentChunk]) -> RagfuseResult<()> {
            Ok(())
        }
        async fn count(&self) -> RagfuseResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn test_normalize_range() {
        let normalized = min_max_normalize(&[2.0, 4.0, 3.0]);
        assert_eq!(normalized, vec![0.0, 1.0, 0.5]);
    }

    #[test]
    fn test_normalize_equal_scores_become_one() {
        assert_eq!(min_max_normalize(&[0.3, 0.3, 0.3]), vec![1.0, 1.0, 1.0]);
        assert_eq!(min_max_normalize(&[-7.0]), vec![1.0]);
    }

    #[test]
    fn test_normalize_empty() {
        assert!(min_max_normalize(&[]).is_empty());
    }

    #[test]
    fn test_normalize_negative_inputs_stay_in_unit_range() {
        let normalized = min_max_normalize(&[-3.0, -1.0, 5.0, 0.0]);
        assert!(normalized.iter().all(|s| (0.0..=1.0).contains(s)));
        assert_eq!(normalized[0], 0.0);
        assert_eq!(normalized[2], 1.0);
    }

    #[tokio::test]
    async fn test_dense_only_chunk_scores_alpha_times_dense() {
        let dense_only = DocumentChunk::new("vector neighbour", "a.txt", 0);
        let other = DocumentChunk::new("another neighbour", "b.txt", 0);
        let scorer = DocumentHybridScorer::new(Arc::new(FixedVector {
            hits: vec![(dense_only.clone(), 0.9), (other.clone(), 0.1)],
        }));

        let results = scorer.hybrid_search("unrelated words", 10, 0.3).await.unwrap();
        assert_eq!(results.len(), 2);
        let top = &results[0];
        assert_eq!(top.chunk_id, Some(dense_only.id));
        assert!((top.relevance_score - 0.3).abs() < 1e-6);
        assert_eq!(results[1].relevance_score, 0.0);
    }

    #[tokio::test]
    async fn test_sparse_only_chunk_scores_one_minus_alpha() {
        let chunk = DocumentChunk::new("lexical match only", "c.txt", 0);
        let scorer = DocumentHybridScorer::new(Arc::new(FixedVector { hits: Vec::new() }));
        scorer.lexical.write().await.add(vec![chunk.clone()]);

        let results = scorer.hybrid_search("lexical", 10, 0.25).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].relevance_score - 0.75).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_sparse_normalization_anchored_by_unmatched_chunks() {
        let heavy = DocumentChunk::new("alpha alpha beta", "a.txt", 0);
        let light = DocumentChunk::new("alpha gamma delta epsilon", "a.txt", 1);
        let other = DocumentChunk::new("other words here", "b.txt", 0);
        let scorer = DocumentHybridScorer::new(Arc::new(FixedVector { hits: Vec::new() }));
        scorer
            .lexical
            .write()
            .await
            .add(vec![heavy.clone(), light.clone(), other.clone()]);

        let raw = scorer.lexical.read().await.score("alpha", 3);
        let expected_light = raw[1].1 / raw[0].1;

        let results = scorer.hybrid_search("alpha", 3, 0.0).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].chunk_id, Some(heavy.id));
        assert_eq!(results[0].relevance_score, 1.0);
        assert_eq!(results[1].chunk_id, Some(light.id));
        assert!(results[1].relevance_score > 0.0);
        assert!((results[1].relevance_score - expected_light).abs() < 1e-6);
        assert_eq!(results[2].chunk_id, Some(other.id));
        assert_eq!(results[2].relevance_score, 0.0);
    }

    #[tokio::test]
    async fn test_same_chunk_in_both_lists_merges() {
        let chunk = DocumentChunk::new("machine learning basics", "ml.pdf", 0);
        let scorer = DocumentHybridScorer::new(Arc::new(FixedVector {
            hits: vec![(chunk.clone(), 0.8)],
        }));
        scorer.lexical.write().await.add(vec![chunk.clone()]);

        let results = scorer.hybrid_search("machine learning", 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1, "one chunk must yield one record");
        assert_eq!(results[0].relevance_score, 1.0);
        assert_eq!(results[0].source_type, SourceType::Document);
        assert_eq!(results[0].credibility_score, 1.0);
    }

    #[tokio::test]
    async fn test_results_sorted_and_truncated() {
        let scorer = DocumentHybridScorer::new(Arc::new(InMemoryVectorIndex::new(Arc::new(
            LocalEmbedding::default(),
        ))));
        let chunks: Vec<DocumentChunk> = vec![
            DocumentChunk::new("rust ownership and borrowing", "rust.md", 0),
            DocumentChunk::new("rust async runtimes", "rust.md", 1),
            DocumentChunk::new("baking sourdough bread", "bread.md", 0),
        ];
        scorer.add_documents(chunks).await.unwrap();

        let results = scorer.hybrid_search("rust async", 2, 0.5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].relevance_score >= results[1].relevance_score);
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.relevance_score)));
        assert_eq!(results[0].content, "rust async runtimes");
    }

    #[tokio::test]
    async fn test_vector_failure_is_search_error() {
        let scorer = DocumentHybridScorer::new(Arc::new(BrokenVector));
        let err = scorer.hybrid_search("anything", 5, 0.5).await.unwrap_err();
        assert!(matches!(err, RagfuseError::Search(_)));
    }

    #[tokio::test]
    async fn test_invalid_alpha_rejected() {
        let scorer = DocumentHybridScorer::new(Arc::new(FixedVector { hits: Vec::new() }));
        let err = scorer.hybrid_search("q", 5, 1.2).await.unwrap_err();
        assert!(matches!(err, RagfuseError::Config(_)));
    }

    #[tokio::test]
    async fn test_stats_track_both_indexes() {
        let scorer = DocumentHybridScorer::new(Arc::new(InMemoryVectorIndex::new(Arc::new(
            LocalEmbedding::default(),
        ))));
        let empty = scorer.stats().await.unwrap();
        assert!(!empty.lexical_ready);

        scorer
            .add_documents(vec![DocumentChunk::new("one chunk", "x", 0)])
            .await
            .unwrap();
        let stats = scorer.stats().await.unwrap();
        assert_eq!(stats.total_chunks, 1);
        assert_eq!(stats.vector_chunks, 1);
        assert!(stats.lexical_ready);
    }
}
