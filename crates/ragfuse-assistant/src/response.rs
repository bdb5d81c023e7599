use chrono::{DateTime, Utc};
use ragfuse_core::{average_credibility, SearchResult, SourceBreakdown};
use ragfuse_monitor::{MetricsExport, MetricsSnapshot};
use ragfuse_search::{DocumentIndexStats, SearchSettings};
use ragfuse_session::CacheStats;
use serde::Serialize;

/// Answer to one query: the ranked evidence and its aggregates.
///
/// On failure `error` is set, `results` is empty and every aggregate is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResponse {
    /// The query as received.
    pub query: String,
    /// Session the query was recorded under.
    pub session_id: String,
    /// Evidence ranked by fused relevance, best first.
    pub results: Vec<SearchResult>,
    /// Number of results.
    pub sources_used: usize,
    /// Results per source type.
    pub source_breakdown: SourceBreakdown,
    /// Mean credibility of the results; 0.0 when there are none.
    pub average_credibility: f32,
    /// Wall-clock time to serve the query, in seconds.
    pub response_time: f64,
    /// Whether the results came from the query cache.
    pub from_cache: bool,
    /// Failure message; absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResponse {
    pub(crate) fn success(
        query: &str,
        session_id: &str,
        results: Vec<SearchResult>,
        response_time: f64,
        from_cache: bool,
    ) -> Self {
        Self {
            query: query.to_string(),
            session_id: session_id.to_string(),
            sources_used: results.len(),
            source_breakdown: SourceBreakdown::from_results(&results),
            average_credibility: average_credibility(&results),
            results,
            response_time,
            from_cache,
            error: None,
        }
    }

    pub(crate) fn failure(query: &str, session_id: &str, error: String, response_time: f64) -> Self {
        Self {
            query: query.to_string(),
            session_id: session_id.to_string(),
            results: Vec::new(),
            sources_used: 0,
            source_breakdown: SourceBreakdown::default(),
            average_credibility: 0.0,
            response_time,
            from_cache: false,
            error: Some(error),
        }
    }

    /// Whether the query was served without error.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// One-line description stored in session history.
    pub(crate) fn summary(&self) -> String {
        format!(
            "{} sources ({} documents, {} web), avg credibility {:.2}",
            self.sources_used,
            self.source_breakdown.documents,
            self.source_breakdown.web,
            self.average_credibility
        )
    }
}

/// Overall state of the assistant.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStats {
    /// Document index sizes.
    pub documents_indexed: DocumentIndexStats,
    /// Sessions currently stored.
    pub sessions_active: usize,
    /// Query cache occupancy.
    pub cache_stats: CacheStats,
    /// Quality monitor snapshot.
    pub quality_metrics: MetricsSnapshot,
    /// Retrieval settings in effect.
    pub settings: SearchSettings,
}

/// System statistics plus the monitor's full export.
#[derive(Debug, Clone, Serialize)]
pub struct AssistantMetricsExport {
    /// Statistics at export time.
    pub system_stats: SystemStats,
    /// The monitor's full export.
    pub quality_metrics: MetricsExport,
    /// When the export was produced.
    pub export_timestamp: DateTime<Utc>,
}
