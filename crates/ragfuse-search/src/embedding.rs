use async_trait::async_trait;
use ragfuse_core::{RagfuseError, RagfuseResult};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use crate::bm25::tokenize;

/// Turns chunk and query text into fixed-length vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed every text, in order. Fails if any text cannot be embedded.
    async fn embed(&self, texts: &[&str]) -> RagfuseResult<Vec<Vec<f32>>>;

    /// Length of every produced vector.
    fn dimension(&self) -> usize;
}

/// Weight of a word-bigram feature relative to a single word.
const BIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing embedder for offline runs and tests.
///
/// Words (tokenized like [`LexicalIndex`](crate::LexicalIndex)) and adjacent
/// word pairs are hashed into buckets with sublinear `1 + ln(tf)` weights,
/// then L2-normalized. Vectors are non-negative, so cosine similarity stays
/// in [0, 1].
#[derive(Debug, Clone)]
pub struct LocalEmbedding {
    dimension: usize,
}

impl LocalEmbedding {
    /// Fails with [`RagfuseError::Config`] if `dimension` is 0.
    pub fn new(dimension: usize) -> RagfuseResult<Self> {
        if dimension == 0 {
            return Err(RagfuseError::Config(
                "Embedding dimension must be at least 1".to_string(),
            ));
        }
        Ok(Self { dimension })
    }

    fn bucket(&self, feature: &(&str, Option<&str>)) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dimension as u64) as usize
    }

    fn embed_one(&self, text: &str) -> RagfuseResult<Vec<f32>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(RagfuseError::Search("Cannot embed empty text".to_string()));
        }

        let mut counts: HashMap<(&str, Option<&str>), (f32, f32)> = HashMap::new();
        for token in &tokens {
            counts.entry((token.as_str(), None)).or_insert((0.0, 1.0)).0 += 1.0;
        }
        for pair in tokens.windows(2) {
            counts
                .entry((pair[0].as_str(), Some(pair[1].as_str())))
                .or_insert((0.0, BIGRAM_WEIGHT))
                .0 += 1.0;
        }

        let mut vector = vec![0.0f32; self.dimension];
        for (feature, (tf, weight)) in &counts {
            vector[self.bucket(feature)] += weight * (1.0 + tf.ln());
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

impl Default for LocalEmbedding {
    fn default() -> Self {
        Self { dimension: 256 }
    }
}

#[async_trait]
impl EmbeddingProvider for LocalEmbedding {
    async fn embed(&self, texts: &[&str]) -> RagfuseResult<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed_one(text)).collect()
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity; 0.0 for mismatched lengths or a zero vector.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    async fn embed(emb: &LocalEmbedding, text: &str) -> Vec<f32> {
        emb.embed(&[text]).await.unwrap().remove(0)
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(matches!(LocalEmbedding::new(0), Err(RagfuseError::Config(_))));
        assert_eq!(LocalEmbedding::new(1).unwrap().dimension(), 1);
    }

    #[tokio::test]
    async fn test_single_bucket_still_embeds() {
        let emb = LocalEmbedding::new(1).unwrap();
        let v = embed(&emb, "anything at all").await;
        assert_eq!(v.len(), 1);
        assert!((v[0] - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_unit_length_and_dimension() {
        let emb = LocalEmbedding::new(64).unwrap();
        let v = embed(&emb, "the quick brown fox jumps").await;
        assert_eq!(v.len(), 64);
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(v.iter().all(|x| *x >= 0.0));
    }

    #[tokio::test]
    async fn test_shared_words_and_order_raise_similarity() {
        let emb = LocalEmbedding::default();
        let base = embed(&emb, "machine learning basics").await;
        let close = embed(&emb, "machine learning models").await;
        let far = embed(&emb, "cooking recipes for dinner").await;
        assert!(cosine_similarity(&base, &close) > cosine_similarity(&base, &far));

        let reordered = embed(&emb, "learning machine basics").await;
        let sim = cosine_similarity(&base, &reordered);
        assert!(sim < 1.0 - 1e-4, "bigrams should separate word orders, got {sim}");
    }

    #[tokio::test]
    async fn test_case_insensitive_and_deterministic() {
        let emb = LocalEmbedding::default();
        assert_eq!(embed(&emb, "Tokio Runtime").await, embed(&emb, "tokio runtime").await);
    }

    #[tokio::test]
    async fn test_empty_text_fails_whole_batch() {
        let emb = LocalEmbedding::default();
        let err = emb.embed(&["fine", "   "]).await.unwrap_err();
        assert!(matches!(err, RagfuseError::Search(_)));
        assert!(emb.embed(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn test_cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
