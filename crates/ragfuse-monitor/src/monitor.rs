use chrono::{DateTime, Utc};
use ragfuse_core::{SearchResult, SourceBreakdown};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::stats::{mean, ResponseTimeStats};

/// Mean latency thresholds (seconds) and the performance score awarded under each.
const LATENCY_BANDS: &[(f64, f64)] = &[(2.0, 1.0), (5.0, 0.8), (10.0, 0.6)];
const SLOW_PERFORMANCE_SCORE: f64 = 0.4;

/// Number of source types a fully diverse result history covers.
const SOURCE_TYPE_COUNT: f64 = 2.0;

#[derive(Debug, Default)]
struct MetricsState {
    total_queries: u64,
    failed_queries: u64,
    avg_response_time: f64,
    credibility_scores: Vec<f32>,
    response_times: Vec<f64>,
    source_distribution: SourceBreakdown,
}

impl MetricsState {
    fn successful_queries(&self) -> u64 {
        self.total_queries - self.failed_queries
    }

    fn success_rate(&self) -> f64 {
        if self.total_queries == 0 {
            1.0
        } else {
            self.successful_queries() as f64 / self.total_queries as f64
        }
    }

    fn avg_credibility(&self) -> f64 {
        let scores: Vec<f64> = self.credibility_scores.iter().map(|&c| f64::from(c)).collect();
        mean(&scores)
    }
}

/// Point-in-time view of the quality metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Every logged query attempt.
    pub total_queries: u64,
    /// Attempts that failed.
    pub failed_queries: u64,
    /// `(total - failed) / total`, 1.0 before the first query.
    pub query_success_rate: f64,
    /// Running mean response time in seconds, stepped on each success with
    /// the attempt count (failed attempts included) as divisor.
    pub avg_response_time: f64,
    /// Statistics over every recorded response time.
    pub response_time_stats: ResponseTimeStats,
    /// Mean credibility over every returned result.
    pub avg_credibility: f64,
    /// Results returned per source type.
    pub source_distribution: SourceBreakdown,
    /// Total results returned.
    pub total_sources: usize,
    /// When the snapshot was taken.
    pub last_updated: DateTime<Utc>,
}

/// Derived scores in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    /// Latency band of the mean response time.
    pub performance_score: f64,
    /// Credibility and source diversity, equally weighted.
    pub quality_score: f64,
    /// The success rate.
    pub reliability_score: f64,
    /// Mean response time in seconds.
    pub avg_response_time: f64,
    /// Mean credibility of returned results.
    pub avg_credibility: f64,
}

/// Full metrics dump for external analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsExport {
    /// Current snapshot.
    pub metrics: MetricsSnapshot,
    /// Scores derived from the snapshot.
    pub performance_summary: PerformanceSummary,
    /// When the export was produced.
    pub export_timestamp: DateTime<Utc>,
}

/// Running quality and latency statistics over served queries.
///
/// Histories grow with every query until [`reset`](Self::reset).
#[derive(Default)]
pub struct QualityMonitor {
    state: RwLock<MetricsState>,
}

impl QualityMonitor {
    /// Create a monitor with no recorded queries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful query that returned `results` in `response_time` seconds.
    pub async fn log_success(&self, query: &str, response_time: f64, results: &[SearchResult]) {
        let mut state = self.state.write().await;
        state.total_queries += 1;

        let count = state.total_queries as f64;
        state.avg_response_time += (response_time - state.avg_response_time) / count;

        for result in results {
            state.source_distribution.record(result.source_type);
            state.credibility_scores.push(result.credibility_score);
        }
        state.response_times.push(response_time);

        info!(
            query_len = query.len(),
            response_time,
            results = results.len(),
            total_queries = state.total_queries,
            "Query logged"
        );
    }

    /// Record a failed query. Only the attempt counters change.
    pub async fn log_failure(&self, query: &str, response_time: f64, error: &str) {
        let mut state = self.state.write().await;
        state.total_queries += 1;
        state.failed_queries += 1;

        warn!(
            query_len = query.len(),
            response_time,
            error,
            failed_queries = state.failed_queries,
            "Query failed"
        );
    }

    /// Current metrics.
    pub async fn metrics(&self) -> MetricsSnapshot {
        let state = self.state.read().await;
        Self::snapshot(&state)
    }

    /// Performance, quality and reliability scores from the current metrics.
    pub async fn performance_summary(&self) -> PerformanceSummary {
        let snapshot = self.metrics().await;
        Self::summarize(&snapshot)
    }

    /// Snapshot plus summary, computed from one consistent view of the state.
    pub async fn export(&self) -> MetricsExport {
        let metrics = self.metrics().await;
        let performance_summary = Self::summarize(&metrics);
        MetricsExport {
            metrics,
            performance_summary,
            export_timestamp: Utc::now(),
        }
    }

    /// Discard all recorded metrics.
    pub async fn reset(&self) {
        *self.state.write().await = MetricsState::default();
        info!("Quality metrics reset");
    }

    fn snapshot(state: &MetricsState) -> MetricsSnapshot {
        MetricsSnapshot {
            total_queries: state.total_queries,
            failed_queries: state.failed_queries,
            query_success_rate: state.success_rate(),
            avg_response_time: state.avg_response_time,
            response_time_stats: ResponseTimeStats::from_samples(&state.response_times),
            avg_credibility: state.avg_credibility(),
            source_distribution: state.source_distribution,
            total_sources: state.source_distribution.total(),
            last_updated: Utc::now(),
        }
    }

    fn summarize(snapshot: &MetricsSnapshot) -> PerformanceSummary {
        PerformanceSummary {
            performance_score: performance_score(snapshot.avg_response_time),
            quality_score: quality_score(snapshot),
            reliability_score: snapshot.query_success_rate,
            avg_response_time: snapshot.avg_response_time,
            avg_credibility: snapshot.avg_credibility,
        }
    }
}

fn performance_score(avg_response_time: f64) -> f64 {
    LATENCY_BANDS
        .iter()
        .find(|(limit, _)| avg_response_time < *limit)
        .map_or(SLOW_PERFORMANCE_SCORE, |(_, score)| *score)
}

fn quality_score(snapshot: &MetricsSnapshot) -> f64 {
    let distribution = &snapshot.source_distribution;
    if distribution.total() == 0 {
        return 0.0;
    }
    let diversity = (distribution.distinct_types() as f64 / SOURCE_TYPE_COUNT).min(1.0);
    0.5 * snapshot.avg_credibility + 0.5 * diversity
}
