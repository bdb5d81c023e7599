//! Research assistant orchestration.
//!
//! [`ResearchAssistant`] wires the fusion engine, query cache, session store
//! and quality monitor into a single query path that always answers with a
//! structured [`QueryResponse`], even when retrieval fails.

/// The assistant and its query path.
pub mod assistant;
/// Benchmark runner and report.
pub mod benchmark;
/// Response and statistics types.
pub mod response;

pub use assistant::ResearchAssistant;
pub use benchmark::{BenchmarkEntry, BenchmarkReport, BENCHMARK_SESSION};
pub use response::{AssistantMetricsExport, QueryResponse, SystemStats};
