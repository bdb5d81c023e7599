//! Operational quality metrics for the retrieval core.
//!
//! [`QualityMonitor`] is updated exactly once per query attempt and exposes
//! point-in-time snapshots ([`MetricsSnapshot`]), derived scores
//! ([`PerformanceSummary`]) and a JSON-serializable export ([`MetricsExport`]).

/// Quality monitor and its reports.
pub mod monitor;
/// Descriptive statistics over metric histories.
pub mod stats;

pub use monitor::{MetricsExport, MetricsSnapshot, PerformanceSummary, QualityMonitor};
pub use stats::ResponseTimeStats;
