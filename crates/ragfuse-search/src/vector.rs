use crate::embedding::{cosine_similarity, EmbeddingProvider};
use async_trait::async_trait;
use ragfuse_core::{DocumentChunk, RagfuseError, RagfuseResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Adapter for an embedding-similarity index.
///
/// The retrieval core never mutates the index beyond appending chunks through
/// [`add_documents`](Self::add_documents); it only decides how the returned
/// similarities are combined with other signals.
#[async_trait]
pub trait VectorSearch: Send + Sync {
    /// Return up to `top_k` chunks most similar to `query`, highest first.
    async fn search(&self, query: &str, top_k: usize) -> RagfuseResult<Vec<(DocumentChunk, f32)>>;

    /// Append chunks to the index.
    async fn add_documents(&self, chunks: &[DocumentChunk]) -> RagfuseResult<()>;

    /// Number of indexed chunks.
    async fn count(&self) -> RagfuseResult<usize>;
}

/// In-memory vector index using brute-force cosine similarity.
/// Suitable for tests and small corpora.
pub struct InMemoryVectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    entries: RwLock<Vec<(DocumentChunk, Vec<f32>)>>,
}

impl InMemoryVectorIndex {
    /// Create an empty index that embeds with `embedder`.
    pub fn new(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embedder,
            entries: RwLock::new(Vec::new()),
        }
    }
}

#[async_trait]
impl VectorSearch for InMemoryVectorIndex {
    async fn search(&self, query: &str, top_k: usize) -> RagfuseResult<Vec<(DocumentChunk, f32)>> {
        if top_k == 0 || self.entries.read().await.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = self
            .embedder
            .embed(&[query])
            .await?
            .pop()
            .ok_or_else(|| RagfuseError::Search("Embedder returned no vector".to_string()))?;
        let entries = self.entries.read().await;

        let mut scored: Vec<(DocumentChunk, f32)> = entries
            .iter()
            .map(|(chunk, embedding)| {
                (chunk.clone(), cosine_similarity(&query_embedding, embedding))
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored)
    }

    async fn add_documents(&self, chunks: &[DocumentChunk]) -> RagfuseResult<()> {
        let texts: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        let embeddings = self.embedder.embed(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(RagfuseError::Search(format!(
                "Embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        let mut entries = self.entries.write().await;
        entries.extend(chunks.iter().cloned().zip(embeddings));
        debug!(added = chunks.len(), total = entries.len(), "Vector index extended");
        Ok(())
    }

    async fn count(&self) -> RagfuseResult<usize> {
        Ok(self.entries.read().await.len())
    }
}
