use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use ragfuse_core::{
    validate_alpha, RagfuseError, RagfuseResult, SearchConfig, SearchResult, SourceBreakdown,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::hybrid::DocumentHybridScorer;
use crate::web::WebSearch;

/// Weight of the incoming relevance score in the final blend.
const RELEVANCE_WEIGHT: f32 = 0.8;
/// Weight of the credibility score in the final blend.
const CREDIBILITY_WEIGHT: f32 = 0.2;
/// Bonus when the whole query appears verbatim in the content.
const EXACT_PHRASE_BONUS: f32 = 0.3;

/// Runtime retrieval settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SearchSettings {
    /// Document results per query.
    pub doc_k: usize,
    /// Web results per query.
    pub web_k: usize,
    /// Dense weight in the document hybrid blend.
    pub alpha: f32,
}

impl From<&SearchConfig> for SearchSettings {
    fn from(config: &SearchConfig) -> Self {
        Self {
            doc_k: config.doc_results,
            web_k: config.web_results,
            alpha: config.hybrid_alpha,
        }
    }
}

/// Query relevance of a piece of text by term overlap.
///
/// `overlap = |query terms ∩ content terms| / |query terms|` over lowercase
/// whitespace tokens, plus 0.3 when the lowercased query occurs verbatim in
/// the lowercased content; capped at 1.0. Empty query or content scores 0.
pub fn term_overlap_relevance(query: &str, content: &str) -> f32 {
    if query.is_empty() || content.is_empty() {
        return 0.0;
    }

    let query_lower = query.to_lowercase();
    let content_lower = content.to_lowercase();

    let query_terms: HashSet<&str> = query_lower.split_whitespace().collect();
    if query_terms.is_empty() {
        return 0.0;
    }
    let content_terms: HashSet<&str> = content_lower.split_whitespace().collect();

    let overlap = query_terms.intersection(&content_terms).count();
    let mut score = overlap as f32 / query_terms.len() as f32;

    if content_lower.contains(&query_lower) {
        score += EXACT_PHRASE_BONUS;
    }

    score.min(1.0)
}

/// Merges document and web evidence into one ranked list.
///
/// Document results come from the [`DocumentHybridScorer`]; web results are
/// scored by [`term_overlap_relevance`]. Every result is then re-scored as
/// `0.8 * relevance + 0.2 * credibility` and the list is stably sorted, so
/// documents win ties against web hits.
pub struct ResultFusionEngine {
    documents: Arc<DocumentHybridScorer>,
    web: Arc<dyn WebSearch>,
    settings: RwLock<SearchSettings>,
    web_timeout: Duration,
}

impl ResultFusionEngine {
    /// Create an engine. `web_timeout` bounds how long fusion waits for the
    /// web branch before continuing with documents only.
    pub fn new(
        documents: Arc<DocumentHybridScorer>,
        web: Arc<dyn WebSearch>,
        settings: SearchSettings,
        web_timeout: Duration,
    ) -> Self {
        Self {
            documents,
            web,
            settings: RwLock::new(settings),
            web_timeout,
        }
    }

    /// The document retriever this engine fuses from.
    pub fn documents(&self) -> &Arc<DocumentHybridScorer> {
        &self.documents
    }

    /// Current runtime settings.
    pub async fn settings(&self) -> SearchSettings {
        *self.settings.read().await
    }

    /// Change any subset of the runtime settings.
    pub async fn update_settings(
        &self,
        doc_k: Option<usize>,
        web_k: Option<usize>,
        alpha: Option<f32>,
    ) -> RagfuseResult<SearchSettings> {
        if let Some(alpha) = alpha {
            validate_alpha(alpha).map_err(RagfuseError::Config)?;
        }

        let mut settings = self.settings.write().await;
        if let Some(doc_k) = doc_k {
            settings.doc_k = doc_k;
        }
        if let Some(web_k) = web_k {
            settings.web_k = web_k;
        }
        if let Some(alpha) = alpha {
            settings.alpha = alpha;
        }
        info!(
            doc_k = settings.doc_k,
            web_k = settings.web_k,
            alpha = settings.alpha,
            "Search settings updated"
        );
        Ok(*settings)
    }

    /// Hybrid document search with the current blend weight.
    pub async fn search_documents(
        &self,
        query: &str,
        top_k: Option<usize>,
    ) -> RagfuseResult<Vec<SearchResult>> {
        let settings = self.settings().await;
        self.documents
            .hybrid_search(query, top_k.unwrap_or(settings.doc_k), settings.alpha)
            .await
    }

    /// Web search scored by term overlap, sorted by relevance.
    ///
    /// Never fails: errors and timeouts are logged and yield no results.
    pub async fn search_web(&self, query: &str, top_k: Option<usize>) -> Vec<SearchResult> {
        let top_k = match top_k {
            Some(k) => k,
            None => self.settings().await.web_k,
        };

        let outcome = match tokio::time::timeout(self.web_timeout, self.web.search(query, top_k)).await
        {
            Ok(result) => result,
            Err(_) => Err(RagfuseError::WebSearch(format!(
                "Web search timed out after {:?}",
                self.web_timeout
            ))),
        };

        match outcome {
            Ok(mut results) => {
                for result in &mut results {
                    result.relevance_score = term_overlap_relevance(query, &result.content);
                }
                results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
                results
            }
            Err(e) => {
                warn!(error = %e, "Web search unavailable, continuing with documents only");
                Vec::new()
            }
        }
    }

    /// Retrieve documents and web hits concurrently and rank them together.
    ///
    /// A web failure degrades to zero web results; a document failure is
    /// returned as an error.
    pub async fn combined_search(
        &self,
        query: &str,
        doc_k: Option<usize>,
        web_k: Option<usize>,
    ) -> RagfuseResult<Vec<SearchResult>> {
        let (documents, web) = tokio::join!(
            self.search_documents(query, doc_k),
            self.search_web(query, web_k)
        );
        let documents = documents.map_err(|e| match e {
            RagfuseError::Search(msg) => {
                RagfuseError::Search(format!("Combined search failed: {msg}"))
            }
            other => other,
        })?;

        let mut results = documents;
        results.extend(web);

        for result in &mut results {
            result.relevance_score = (RELEVANCE_WEIGHT * result.relevance_score
                + CREDIBILITY_WEIGHT * result.credibility_score)
                .clamp(0.0, 1.0);
        }
        results.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        let breakdown = SourceBreakdown::from_results(&results);
        info!(
            total = results.len(),
            documents = breakdown.documents,
            web = breakdown.web,
            "Combined search complete"
        );
        Ok(results)
    }
}
