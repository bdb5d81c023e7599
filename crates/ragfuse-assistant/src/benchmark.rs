use ragfuse_core::SourceBreakdown;
use serde::Serialize;
use tracing::info;

use crate::assistant::ResearchAssistant;

/// Session that benchmark queries are recorded under.
pub const BENCHMARK_SESSION: &str = "benchmark";

/// Outcome of one benchmark query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkEntry {
    /// The query as run.
    pub query: String,
    /// Seconds spent serving the query.
    pub response_time: f64,
    /// Whether the query was served without error.
    pub success: bool,
    /// Results returned.
    pub sources_used: usize,
    /// Failure message, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate results of a benchmark run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    /// Queries run.
    pub total_queries: usize,
    /// Mean response time over all queries; 0.0 for an empty run.
    pub avg_response_time: f64,
    /// Fraction of queries served without error; 0.0 for an empty run.
    pub success_rate: f64,
    /// Results returned per source type, summed over the run.
    pub source_coverage: SourceBreakdown,
    /// One entry per query, in run order.
    pub individual_results: Vec<BenchmarkEntry>,
}

impl ResearchAssistant {
    /// Run each query once, uncached, under the [`BENCHMARK_SESSION`] session.
    pub async fn benchmark<S: AsRef<str>>(&self, queries: &[S]) -> BenchmarkReport {
        let mut individual_results = Vec::with_capacity(queries.len());
        let mut source_coverage = SourceBreakdown::default();
        let mut total_time = 0.0;
        let mut successful = 0usize;

        for query in queries {
            let query = query.as_ref();
            let response = self.query(query, BENCHMARK_SESSION, false).await;
            total_time += response.response_time;

            if response.is_success() {
                successful += 1;
                source_coverage.documents += response.source_breakdown.documents;
                source_coverage.web += response.source_breakdown.web;
            }

            individual_results.push(BenchmarkEntry {
                query: query.to_string(),
                response_time: response.response_time,
                success: response.is_success(),
                sources_used: response.sources_used,
                error: response.error,
            });
        }

        let total_queries = queries.len();
        let (avg_response_time, success_rate) = if total_queries == 0 {
            (0.0, 0.0)
        } else {
            (
                total_time / total_queries as f64,
                successful as f64 / total_queries as f64,
            )
        };

        info!(
            total_queries,
            successful,
            avg_response_time,
            "Benchmark complete"
        );

        BenchmarkReport {
            total_queries,
            avg_response_time,
            success_rate,
            source_coverage,
            individual_results,
        }
    }
}
