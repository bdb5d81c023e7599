use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of characters of chunk content kept in a document snippet.
const SNIPPET_CHARS: usize = 200;

/// Stable identifier assigned to a [`DocumentChunk`] at ingestion.
///
/// Dense and sparse hits for the same chunk are merged on this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkId(pub Uuid);

impl ChunkId {
    /// Allocate a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ChunkId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A chunk of an ingested document. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Identity used to merge hits from different indexes.
    pub id: ChunkId,
    /// Text content of the chunk.
    pub content: String,
    /// Identifier of the document the chunk was cut from (usually a file name).
    pub source: String,
    /// Position of the chunk within its source document.
    pub chunk_index: usize,
    /// When the chunk was ingested.
    pub created_at: DateTime<Utc>,
}

impl DocumentChunk {
    /// Creates a chunk with a fresh id and the current timestamp.
    pub fn new(content: impl Into<String>, source: impl Into<String>, chunk_index: usize) -> Self {
        Self {
            id: ChunkId::new(),
            content: content.into(),
            source: source.into(),
            chunk_index,
            created_at: Utc::now(),
        }
    }
}

/// Where a [`SearchResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// A chunk of an ingested document.
    Document,
    /// A hit returned by the web search API.
    Web,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Document => write!(f, "document"),
            SourceType::Web => write!(f, "web"),
        }
    }
}

/// A piece of retrieved evidence, from either the document corpus or the web.
///
/// `relevance_score` is overwritten at every ranking stage;
/// `credibility_score` is fixed when the result is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Full text of the evidence.
    pub content: String,
    /// Source file for documents, URL for web hits.
    pub source: String,
    /// Document or web.
    pub source_type: SourceType,
    /// Relevance in [0, 1].
    pub relevance_score: f32,
    /// Trust estimate in [0, 1].
    pub credibility_score: f32,
    /// Short excerpt for display.
    pub snippet: String,
    /// When the result was produced.
    pub timestamp: DateTime<Utc>,
    /// Originating chunk, for document results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_id: Option<ChunkId>,
}

impl SearchResult {
    /// Builds a document result. Documents are fully credible.
    pub fn document(chunk: &DocumentChunk, relevance_score: f32) -> Self {
        Self {
            content: chunk.content.clone(),
            source: chunk.source.clone(),
            source_type: SourceType::Document,
            relevance_score,
            credibility_score: 1.0,
            snippet: document_snippet(&chunk.content),
            timestamp: Utc::now(),
            chunk_id: Some(chunk.id),
        }
    }

    /// Builds a web result. Relevance starts at zero and is filled in by fusion.
    pub fn web(snippet: impl Into<String>, link: impl Into<String>, credibility_score: f32) -> Self {
        let snippet = snippet.into();
        Self {
            content: snippet.clone(),
            source: link.into(),
            source_type: SourceType::Web,
            relevance_score: 0.0,
            credibility_score,
            snippet,
            timestamp: Utc::now(),
            chunk_id: None,
        }
    }
}

fn document_snippet(content: &str) -> String {
    let mut snippet: String = content.chars().take(SNIPPET_CHARS).collect();
    snippet.push_str("...");
    snippet
}

/// Per-source-type result counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceBreakdown {
    /// Number of document results.
    pub documents: usize,
    /// Number of web results.
    pub web: usize,
}

impl SourceBreakdown {
    /// Counts results by source type.
    pub fn from_results(results: &[SearchResult]) -> Self {
        let mut breakdown = Self::default();
        for result in results {
            breakdown.record(result.source_type);
        }
        breakdown
    }

    /// Increments the counter for one result of the given type.
    pub fn record(&mut self, source_type: SourceType) {
        match source_type {
            SourceType::Document => self.documents += 1,
            SourceType::Web => self.web += 1,
        }
    }

    /// Total number of results counted.
    pub fn total(&self) -> usize {
        self.documents + self.web
    }

    /// Number of source types with at least one result.
    pub fn distinct_types(&self) -> usize {
        usize::from(self.documents > 0) + usize::from(self.web > 0)
    }
}

/// Mean credibility of a result list, or 0.0 when empty.
pub fn average_credibility(results: &[SearchResult]) -> f32 {
    if results.is_empty() {
        return 0.0;
    }
    let total: f32 = results.iter().map(|r| r.credibility_score).sum();
    total / results.len() as f32
}
