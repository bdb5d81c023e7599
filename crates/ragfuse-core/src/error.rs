use thiserror::Error;

/// A convenience `Result` alias using [`RagfuseError`].
pub type RagfuseResult<T> = Result<T, RagfuseError>;

/// Top-level error type for the retrieval core.
///
/// Each variant corresponds to a failure class with its own handling policy:
/// configuration errors are fatal at startup, search errors propagate to the
/// caller, and web search errors are absorbed by result fusion.
#[derive(Error, Debug)]
pub enum RagfuseError {
    /// Invalid weight, TTL, chunk bounds, or an unreadable configuration source.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Lexical, vector, or fusion failure.
    #[error("Search error: {0}")]
    Search(String),

    /// Missing credential, HTTP failure, or timeout in the web search adapter.
    #[error("Web search error: {0}")]
    WebSearch(String),

    /// Session lookup or bookkeeping failure.
    #[error("Session error: {0}")]
    Session(String),

    /// A JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RagfuseError {
    /// Whether this error comes from the supplementary web source and can be
    /// degraded to "no web results".
    pub fn is_web_search(&self) -> bool {
        matches!(self, Self::WebSearch(_))
    }
}
