use crate::error::{RagfuseError, RagfuseResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Hard upper bound on results per web search request imposed by the API.
pub const MAX_WEB_RESULTS_PER_REQUEST: usize = 20;

/// Top-level configuration for the retrieval core.
///
/// Every section has defaults, so an empty TOML document is a valid config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagfuseConfig {
    /// Retrieval counts and blend weight.
    #[serde(default)]
    pub search: SearchConfig,
    /// Query cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Chunk bounds used by the (external) ingestion pipeline.
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Web search API settings.
    #[serde(default)]
    pub web: WebSearchConfig,
}

/// Retrieval counts and the dense/sparse blend weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Default number of document results.
    #[serde(default = "default_doc_results")]
    pub doc_results: usize,
    /// Default number of web results.
    #[serde(default = "default_web_results")]
    pub web_results: usize,
    /// Weight of the dense score in the hybrid blend (0 = pure BM25, 1 = pure vector).
    #[serde(default = "default_hybrid_alpha")]
    pub hybrid_alpha: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            doc_results: default_doc_results(),
            web_results: default_web_results(),
            hybrid_alpha: default_hybrid_alpha(),
        }
    }
}

/// Query cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live of a cached result set, in seconds. Must be non-negative.
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

impl CacheConfig {
    /// The TTL as a [`Duration`]. Negative values clamp to zero; `validate` rejects them.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(u64::try_from(self.ttl_secs).unwrap_or(0))
    }
}

/// Chunk size bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size in characters.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,
    /// Overlap between consecutive chunks, in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Web search API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSearchConfig {
    /// API key. Searches fail with a web search error while this is unset.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Search endpoint URL.
    #[serde(default = "default_web_endpoint")]
    pub endpoint: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_web_timeout")]
    pub timeout_secs: u64,
    /// Country code sent as `gl`.
    #[serde(default = "default_country")]
    pub country: String,
    /// Language code sent as `hl`.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_web_endpoint(),
            timeout_secs: default_web_timeout(),
            country: default_country(),
            language: default_language(),
        }
    }
}

impl WebSearchConfig {
    /// The request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_doc_results() -> usize {
    5
}
fn default_web_results() -> usize {
    5
}
fn default_hybrid_alpha() -> f32 {
    0.5
}
fn default_cache_ttl() -> i64 {
    3600
}
fn default_max_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_web_endpoint() -> String {
    "https://google.serper.dev/search".to_string()
}
fn default_web_timeout() -> u64 {
    30
}
fn default_country() -> String {
    "us".to_string()
}
fn default_language() -> String {
    "en".to_string()
}

impl RagfuseConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> RagfuseResult<Self> {
        toml::from_str(source)
            .map_err(|e| RagfuseError::Config(format!("Invalid config: {e}")))
    }

    /// Read and parse a TOML file.
    pub fn load(path: &Path) -> RagfuseResult<Self> {
        let source = std::fs::read_to_string(path).map_err(|e| {
            RagfuseError::Config(format!(
                "Failed to read config file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&source)
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> RagfuseResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    ///
    /// Recognized keys: `SERPER_API_KEY`, `CACHE_TTL`, `MAX_CHUNK_SIZE`,
    /// `CHUNK_OVERLAP`, `HYBRID_ALPHA`.
    pub fn with_overrides<F>(mut self, lookup: F) -> RagfuseResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("SERPER_API_KEY").filter(|k| !k.is_empty()) {
            self.web.api_key = Some(key);
        }
        if let Some(ttl) = lookup("CACHE_TTL") {
            self.cache.ttl_secs = parse_override("CACHE_TTL", &ttl)?;
        }
        if let Some(size) = lookup("MAX_CHUNK_SIZE") {
            self.chunking.max_chunk_size = parse_override("MAX_CHUNK_SIZE", &size)?;
        }
        if let Some(overlap) = lookup("CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = parse_override("CHUNK_OVERLAP", &overlap)?;
        }
        if let Some(alpha) = lookup("HYBRID_ALPHA") {
            self.search.hybrid_alpha = parse_override("HYBRID_ALPHA", &alpha)?;
        }
        debug!(
            ttl_secs = self.cache.ttl_secs,
            alpha = self.search.hybrid_alpha,
            web_key_set = self.web.api_key.is_some(),
            "Configuration overrides applied"
        );
        Ok(self)
    }

    /// Check all bounds, reporting every violation at once.
    pub fn validate(&self) -> RagfuseResult<()> {
        let mut errors = Vec::new();

        if self.cache.ttl_secs < 0 {
            errors.push("CACHE_TTL must be non-negative".to_string());
        }
        if let Err(e) = validate_alpha(self.search.hybrid_alpha) {
            errors.push(e);
        }
        if self.chunking.max_chunk_size == 0 {
            errors.push("MAX_CHUNK_SIZE must be positive".to_string());
        }
        if self.chunking.chunk_overlap >= self.chunking.max_chunk_size {
            errors.push("CHUNK_OVERLAP must be less than MAX_CHUNK_SIZE".to_string());
        }
        if self.web.timeout_secs == 0 {
            errors.push("web timeout must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RagfuseError::Config(format!(
                "Configuration validation failed: {}",
                errors.join("; ")
            )))
        }
    }
}

/// Check that a hybrid blend weight lies in [0, 1].
pub fn validate_alpha(alpha: f32) -> Result<(), String> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(format!("HYBRID_ALPHA must be between 0 and 1, got {alpha}"))
    }
}

fn parse_override<T>(key: &str, raw: &str) -> RagfuseResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| RagfuseError::Config(format!("Invalid value for {key} ('{raw}'): {e}")))
}
