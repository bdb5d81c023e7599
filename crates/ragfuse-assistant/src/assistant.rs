use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use ragfuse_core::{DocumentChunk, RagfuseConfig, RagfuseError, RagfuseResult};
use ragfuse_monitor::{MetricsExport, QualityMonitor};
use ragfuse_search::{
    DocumentHybridScorer, ResultFusionEngine, SearchSettings, VectorSearch, WebSearch,
};
use ragfuse_session::{InMemorySessionStore, QueryCache, QueryRecord, SessionStore};
use tracing::{error, info};

use crate::response::{AssistantMetricsExport, QueryResponse, SystemStats};

/// Entry point of the retrieval core.
///
/// One assistant is meant to be shared behind an [`Arc`] by concurrent
/// callers. Each component keeps its own lock, so a query holds no lock for
/// its whole duration.
pub struct ResearchAssistant {
    engine: ResultFusionEngine,
    cache: QueryCache,
    sessions: Arc<dyn SessionStore>,
    monitor: QualityMonitor,
}

impl ResearchAssistant {
    /// Build an assistant over the given vector index and web source.
    ///
    /// Fails with [`RagfuseError::Config`] if `config` does not validate.
    pub fn new(
        config: RagfuseConfig,
        vector: Arc<dyn VectorSearch>,
        web: Arc<dyn WebSearch>,
    ) -> RagfuseResult<Self> {
        config.validate()?;

        let documents = Arc::new(DocumentHybridScorer::new(vector));
        let engine = ResultFusionEngine::new(
            documents,
            web,
            SearchSettings::from(&config.search),
            config.web.timeout(),
        );

        info!(
            doc_k = config.search.doc_results,
            web_k = config.search.web_results,
            alpha = config.search.hybrid_alpha,
            cache_ttl_secs = config.cache.ttl_secs,
            "Research assistant initialized"
        );

        Ok(Self {
            engine,
            cache: QueryCache::new(config.cache.ttl()),
            sessions: Arc::new(InMemorySessionStore::new()),
            monitor: QualityMonitor::new(),
        })
    }

    /// Replace the session backend.
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    /// Index chunks in both the vector and the lexical index.
    pub async fn add_documents(&self, chunks: Vec<DocumentChunk>) -> RagfuseResult<()> {
        self.engine.documents().add_documents(chunks).await
    }

    /// Record that `document` belongs to the session's working set.
    pub async fn register_document(&self, session_id: &str, document: &str) -> RagfuseResult<bool> {
        self.sessions.add_document(session_id, document).await
    }

    /// Answer a query. Never fails: errors are reported in
    /// [`QueryResponse::error`] and counted as failed queries.
    pub async fn query(&self, query: &str, session_id: &str, use_cache: bool) -> QueryResponse {
        let start = Instant::now();

        match self.serve(query, session_id, use_cache, start).await {
            Ok(response) => response,
            Err(e) => {
                let elapsed = start.elapsed().as_secs_f64();
                let message = e.to_string();
                error!(session_id, error = %message, "Query processing failed");
                self.monitor.log_failure(query, elapsed, &message).await;
                QueryResponse::failure(query, session_id, message, elapsed)
            }
        }
    }

    async fn serve(
        &self,
        query: &str,
        session_id: &str,
        use_cache: bool,
        start: Instant,
    ) -> RagfuseResult<QueryResponse> {
        if query.trim().is_empty() {
            return Err(RagfuseError::Search("Query must not be empty".to_string()));
        }
        if session_id.is_empty() {
            return Err(RagfuseError::Session("Session id must not be empty".to_string()));
        }

        // Session writes run before the monitor and cache are updated.
        if use_cache {
            if let Some(results) = self.cache.get(query).await {
                info!(session_id, results = results.len(), "Serving cached results");
                let response = QueryResponse::success(
                    query,
                    session_id,
                    results,
                    start.elapsed().as_secs_f64(),
                    true,
                );
                self.sessions.record_cache_hit(session_id).await?;
                self.sessions
                    .add_query(session_id, query, &response.summary())
                    .await?;
                self.monitor
                    .log_success(query, response.response_time, &response.results)
                    .await;
                return Ok(response);
            }
        }

        let results = self.engine.combined_search(query, None, None).await?;
        let response = QueryResponse::success(
            query,
            session_id,
            results,
            start.elapsed().as_secs_f64(),
            false,
        );
        self.sessions
            .add_query(session_id, query, &response.summary())
            .await?;

        if use_cache {
            self.cache.put(query, response.results.clone(), None).await;
        }
        self.monitor
            .log_success(query, response.response_time, &response.results)
            .await;

        Ok(response)
    }

    /// Indexes, sessions, cache, quality metrics and settings in one view.
    pub async fn system_stats(&self) -> RagfuseResult<SystemStats> {
        Ok(SystemStats {
            documents_indexed: self.engine.documents().stats().await?,
            sessions_active: self.sessions.list_sessions().await?.len(),
            cache_stats: self.cache.stats().await,
            quality_metrics: self.monitor.metrics().await,
            settings: self.engine.settings().await,
        })
    }

    /// Change retrieval settings; `None` keeps the current value.
    pub async fn update_settings(
        &self,
        doc_k: Option<usize>,
        web_k: Option<usize>,
        alpha: Option<f32>,
    ) -> RagfuseResult<SearchSettings> {
        self.engine.update_settings(doc_k, web_k, alpha).await
    }

    /// Retrieval settings in effect.
    pub async fn settings(&self) -> SearchSettings {
        self.engine.settings().await
    }

    /// Drop every cached result list, returning how many were removed.
    pub async fn clear_cache(&self) -> usize {
        let removed = self.cache.clear().await;
        info!(removed, "Query cache cleared");
        removed
    }

    /// Query history of a session; empty for unknown sessions.
    pub async fn session_history(&self, session_id: &str) -> RagfuseResult<Vec<QueryRecord>> {
        Ok(self
            .sessions
            .get_session(session_id)
            .await?
            .map(|session| session.queries)
            .unwrap_or_default())
    }

    /// The session backend.
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// The quality monitor.
    pub fn monitor(&self) -> &QualityMonitor {
        &self.monitor
    }

    /// System statistics and quality metrics for external analysis.
    pub async fn export_metrics(&self) -> RagfuseResult<AssistantMetricsExport> {
        let system_stats = self.system_stats().await?;
        let quality_metrics: MetricsExport = self.monitor.export().await;
        Ok(AssistantMetricsExport {
            system_stats,
            quality_metrics,
            export_timestamp: Utc::now(),
        })
    }
}
