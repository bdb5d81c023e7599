//! Core types, errors, and configuration for the ragfuse retrieval core.
//!
//! This crate provides the foundational types shared across all ragfuse crates.
//!
//! # Main types
//!
//! - [`RagfuseError`]: Error taxonomy (configuration, search, web search, session).
//! - [`RagfuseResult`]: Convenience alias for `Result<T, RagfuseError>`.
//! - [`DocumentChunk`]: An ingested chunk of a document with a stable [`ChunkId`].
//! - [`SearchResult`]: A ranked piece of evidence from a document or the web.
//! - [`SourceBreakdown`]: Per-source-type result counts.
//! - [`RagfuseConfig`]: TOML/env configuration with validation.

/// Configuration loading and validation.
pub mod config;
/// Error types.
pub mod error;
/// Shared data model.
pub mod types;

pub use config::{
    validate_alpha, CacheConfig, ChunkingConfig, RagfuseConfig, SearchConfig, WebSearchConfig,
    MAX_WEB_RESULTS_PER_REQUEST,
};
pub use error::{RagfuseError, RagfuseResult};
pub use types::{
    average_credibility, ChunkId, DocumentChunk, SearchResult, SourceBreakdown, SourceType,
};
