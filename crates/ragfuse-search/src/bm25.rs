use ragfuse_core::DocumentChunk;
use std::collections::HashMap;
use tracing::debug;

/// BM25 parameters.
const K1: f32 = 1.2;
const B: f32 = 0.75;

/// Tokenize text into lowercase whitespace-separated terms.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// A BM25 inverted index over document chunks.
///
/// The index is append-only. Every call to [`add`](Self::add) re-tokenizes
/// and re-indexes the whole corpus, which keeps document-length statistics
/// exact at the cost of batch-sized work per ingestion.
#[derive(Debug, Clone, Default)]
pub struct LexicalIndex {
    /// Chunks in ingestion order; positions are used as internal doc ids.
    chunks: Vec<DocumentChunk>,
    /// term -> (chunk position, term frequency)
    postings: HashMap<String, Vec<(usize, f32)>>,
    /// chunk position -> document length (token count)
    doc_lengths: Vec<f32>,
    avg_doc_length: f32,
}

impl LexicalIndex {
    /// Create a new, empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append chunks and rebuild the index over the full corpus.
    pub fn add(&mut self, chunks: impl IntoIterator<Item = DocumentChunk>) {
        let before = self.chunks.len();
        self.chunks.extend(chunks);
        self.reindex();
        debug!(
            added = self.chunks.len() - before,
            total = self.chunks.len(),
            terms = self.postings.len(),
            "Lexical index rebuilt"
        );
    }

    /// Score the query against every chunk and return the `top_k` best
    /// matches, highest first.
    ///
    /// Uses the BM25 formula with Robertson's non-negative IDF:
    /// ```text
    /// score = sum over query terms of:
    ///   IDF(t) * (tf * (k1 + 1)) / (tf + k1 * (1 - b + b * dl / avgdl))
    /// IDF(t) = ln((N - df + 0.5) / (df + 0.5) + 1.0)
    /// ```
    /// Every chunk is ranked, so chunks sharing no term with the query score
    /// 0.0 and fill the tail when fewer than `top_k` chunks match. Equal scores
    /// keep ingestion order.
    pub fn score(&self, query: &str, top_k: usize) -> Vec<(DocumentChunk, f32)> {
        if self.chunks.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let query_tokens = tokenize(query);
        if query_tokens.is_empty() {
            return Vec::new();
        }

        let n = self.chunks.len() as f32;
        let avgdl = if self.avg_doc_length > 0.0 {
            self.avg_doc_length
        } else {
            1.0
        };
        let mut scores = vec![0.0f32; self.chunks.len()];

        for token in &query_tokens {
            let Some(postings) = self.postings.get(token) else {
                continue;
            };
            let df = postings.len() as f32;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();

            for &(pos, tf) in postings {
                let dl = self.doc_lengths[pos];
                let numerator = tf * (K1 + 1.0);
                let denominator = tf + K1 * (1.0 - B + B * dl / avgdl);
                scores[pos] += idf * numerator / denominator;
            }
        }

        let mut ranked: Vec<(usize, f32)> = scores.into_iter().enumerate().collect();
        // Stable sort: ties stay in ingestion order.
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(top_k);

        ranked
            .into_iter()
            .map(|(pos, score)| (self.chunks[pos].clone(), score))
            .collect()
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    fn reindex(&mut self) {
        self.postings.clear();
        self.doc_lengths.clear();

        for (pos, chunk) in self.chunks.iter().enumerate() {
            let tokens = tokenize(&chunk.content);
            self.doc_lengths.push(tokens.len() as f32);

            let mut term_freq: HashMap<String, f32> = HashMap::new();
            for token in tokens {
                *term_freq.entry(token).or_insert(0.0) += 1.0;
            }
            for (term, freq) in term_freq {
                self.postings.entry(term).or_default().push((pos, freq));
            }
        }

        self.avg_doc_length = if self.chunks.is_empty() {
            0.0
        } else {
            self.doc_lengths.iter().sum::<f32>() / self.chunks.len() as f32
        };
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> DocumentChunk {
        DocumentChunk::new(text, "test.txt", 0)
    }

    #[test]
    fn test_add_and_score_finds_chunk() {
        let mut index = LexicalIndex::new();
        let c = chunk("the quick brown fox jumps over the lazy dog");
        let id = c.id;
        index.add(vec![c]);

        let results = index.score("quick brown fox", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.id, id);
        assert!(results[0].1 > 0.0, "score should be positive");
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let index = LexicalIndex::new();
        assert!(index.score("anything", 10).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_no_matches_scores_zero() {
        let mut index = LexicalIndex::new();
        index.add(vec![chunk("rust programming language")]);
        let results = index.score("cooking recipes dinner", 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].1, 0.0);
        assert!(index.score("   ", 10).is_empty());
    }

    #[test]
    fn test_unmatched_chunks_fill_top_k() {
        let mut index = LexicalIndex::new();
        let heavy = chunk("alpha alpha beta");
        let light = chunk("alpha gamma delta epsilon");
        let other = chunk("other words here");
        let (heavy_id, light_id, other_id) = (heavy.id, light.id, other.id);
        index.add(vec![heavy, light, other]);

        let results = index.score("alpha", 3);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.id, heavy_id);
        assert_eq!(results[1].0.id, light_id);
        assert_eq!(results[2].0.id, other_id);
        assert!(results[1].1 > 0.0);
        assert_eq!(results[2].1, 0.0);
    }

    #[test]
    fn test_tokenization_is_case_insensitive_whitespace_only() {
        let mut index = LexicalIndex::new();
        index.add(vec![chunk("Machine LEARNING, basics")]);

        assert!(index.score("machine", 5)[0].1 > 0.0);
        // Punctuation stays attached to the token.
        assert_eq!(index.score("learning", 5)[0].1, 0.0);
        assert!(index.score("learning,", 5)[0].1 > 0.0);
    }

    #[test]
    fn test_ranking_prefers_more_matching_terms() {
        let mut index = LexicalIndex::new();
        let rust = chunk("rust is a systems programming language rust is fast rust is safe");
        let python = chunk("python is a scripting programming language used for data science");
        let cooking = chunk("cooking recipes for a delicious dinner meal");
        let (rust_id, python_id, cooking_id) = (rust.id, python.id, cooking.id);
        index.add(vec![rust, python, cooking]);

        let results = index.score("rust programming", 10);
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].0.id, rust_id);
        assert_eq!(results[1].0.id, python_id);
        assert_eq!(results[2].0.id, cooking_id);
        assert!(results[0].1 > results[1].1);
        assert!(results[1].1 > 0.0);
        assert_eq!(results[2].1, 0.0);
    }

    #[test]
    fn test_top_k_truncates() {
        let mut index = LexicalIndex::new();
        index.add((0..5).map(|i| DocumentChunk::new(format!("shared term {i}"), "doc", i)));
        assert_eq!(index.score("shared", 3).len(), 3);
        assert!(index.score("shared", 0).is_empty());
    }

    #[test]
    fn test_ties_keep_ingestion_order() {
        let mut index = LexicalIndex::new();
        let first = chunk("alpha beta");
        let second = chunk("alpha beta");
        let (first_id, second_id) = (first.id, second.id);
        index.add(vec![first]);
        index.add(vec![second]);

        let results = index.score("alpha", 10);
        assert_eq!(results[0].0.id, first_id);
        assert_eq!(results[1].0.id, second_id);
        assert_eq!(results[0].1, results[1].1);
    }

    #[test]
    fn test_append_reindexes_idf() {
        let mut index = LexicalIndex::new();
        index.add(vec![chunk("rare word here")]);
        let alone = index.score("rare", 1)[0].1;

        index.add(vec![chunk("common text"), chunk("more common text")]);
        assert_eq!(index.len(), 3);
        let with_corpus = index.score("rare", 1)[0].1;
        // IDF grows as the term becomes rarer relative to the corpus.
        assert!(with_corpus > alone);
    }
}
