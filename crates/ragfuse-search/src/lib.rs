//! Hybrid retrieval: lexical, dense, and web search fused into one ranking.
//!
//! # Main types
//!
//! - [`LexicalIndex`]: BM25 inverted index over document chunks.
//! - [`VectorSearch`]: Adapter trait for an external embedding-similarity index.
//! - [`InMemoryVectorIndex`]: Brute-force cosine index over a local [`EmbeddingProvider`].
//! - [`DocumentHybridScorer`]: Min-max normalized linear blend of dense and sparse scores.
//! - [`WebSearch`] / [`SerperWebSearch`]: Web search adapter with credibility scoring.
//! - [`ResultFusionEngine`]: Merges document and web results by relevance and credibility.

/// BM25 lexical index.
pub mod bm25;
/// Embedding provider trait and local implementation.
pub mod embedding;
/// Result fusion across documents and the web.
pub mod fusion;
/// Dense + sparse document scoring.
pub mod hybrid;
/// Vector search adapter trait and in-memory implementation.
pub mod vector;
/// Web search adapter and credibility heuristic.
pub mod web;

pub use bm25::LexicalIndex;
pub use embedding::{EmbeddingProvider, LocalEmbedding};
pub use fusion::{term_overlap_relevance, ResultFusionEngine, SearchSettings};
pub use hybrid::{min_max_normalize, DocumentHybridScorer, DocumentIndexStats};
pub use vector::{InMemoryVectorIndex, VectorSearch};
pub use web::{assess_credibility, SerperWebSearch, WebSearch};
