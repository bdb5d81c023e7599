use async_trait::async_trait;
use ragfuse_core::{
    RagfuseError, RagfuseResult, SearchResult, WebSearchConfig, MAX_WEB_RESULTS_PER_REQUEST,
};
use reqwest::Url;
use serde::Deserialize;
use tracing::{info, warn};

/// Credibility assigned to a hit without a URL.
const EMPTY_URL_CREDIBILITY: f32 = 0.3;
const BASE_CREDIBILITY: f32 = 0.5;
const TRUSTED_DOMAIN_BONUS: f32 = 0.3;
const HTTPS_BONUS: f32 = 0.1;
const EDU_GOV_BONUS: f32 = 0.2;
const REFERENCE_DOMAIN_BONUS: f32 = 0.1;

/// The single highest-trust reference domain.
const REFERENCE_DOMAIN: &str = "wikipedia.org";

/// High-trust hosts: encyclopedias, academic publishers and indexes,
/// government and standards bodies. Subdomains match too.
const TRUSTED_DOMAINS: &[&str] = &[
    "wikipedia.org",
    "britannica.com",
    "nature.com",
    "sciencedirect.com",
    "ieee.org",
    "acm.org",
    "springer.com",
    "arxiv.org",
    "pubmed.ncbi.nlm.nih.gov",
    "researchgate.net",
    "scholar.google.com",
    "w3.org",
    "ietf.org",
    "iso.org",
];

/// Top-level labels treated as high-trust on their own.
const TRUSTED_LABELS: &[&str] = &["edu", "gov", "org"];

/// A source of web search hits.
#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Search the web for `query`, returning at most `top_k` hits.
    ///
    /// Hits carry a credibility score and a relevance score of zero; relevance
    /// depends on the query and is assigned during fusion.
    async fn search(&self, query: &str, top_k: usize) -> RagfuseResult<Vec<SearchResult>>;
}

#[derive(Debug, Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<OrganicHit>,
}

#[derive(Debug, Deserialize)]
struct OrganicHit {
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    link: String,
}

/// Web search backed by the Serper Google search API.
pub struct SerperWebSearch {
    config: WebSearchConfig,
    http: reqwest::Client,
}

impl SerperWebSearch {
    /// Build the adapter. The HTTP client enforces `config.timeout_secs`.
    pub fn new(config: WebSearchConfig) -> RagfuseResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| RagfuseError::Config(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// Whether an API key is configured.
    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Run a one-result probe query; `true` if at least one hit came back.
    pub async fn test_connection(&self) -> bool {
        match self.search("test", 1).await {
            Ok(results) => !results.is_empty(),
            Err(e) => {
                warn!(error = %e, "Web search connection test failed");
                false
            }
        }
    }
}

#[async_trait]
impl WebSearch for SerperWebSearch {
    async fn search(&self, query: &str, top_k: usize) -> RagfuseResult<Vec<SearchResult>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| RagfuseError::WebSearch("Serper API key is required".to_string()))?;

        if top_k == 0 {
            return Ok(Vec::new());
        }

        let body = serde_json::json!({
            "q": query,
            "num": top_k.min(MAX_WEB_RESULTS_PER_REQUEST),
            "gl": self.config.country,
            "hl": self.config.language,
        });

        info!(query_len = query.len(), top_k, "Performing web search");

        let resp = self
            .http
            .post(&self.config.endpoint)
            .header("X-API-KEY", api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RagfuseError::WebSearch(format!("Web search timed out: {e}"))
                } else {
                    RagfuseError::WebSearch(format!("Web search request failed: {e}"))
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RagfuseError::WebSearch(format!(
                "Web search API returned {status}: {text}"
            )));
        }

        let parsed: SerperResponse = resp
            .json()
            .await
            .map_err(|e| RagfuseError::WebSearch(format!("Invalid web search response: {e}")))?;

        let results: Vec<SearchResult> = parsed
            .organic
            .into_iter()
            .take(top_k)
            .map(|hit| {
                let credibility = assess_credibility(&hit.link);
                SearchResult::web(hit.snippet, hit.link, credibility)
            })
            .collect();

        info!(results = results.len(), "Web search returned");
        Ok(results)
    }
}

/// Heuristic trust estimate for a URL, in [0.3, 1.0].
///
/// Empty URL → 0.3. Otherwise a 0.5 base, +0.3 for a high-trust host,
/// +0.1 for `https`, +0.2 for `.edu`/`.gov` hosts, +0.1 for the reference
/// encyclopedia; capped at 1.0.
pub fn assess_credibility(url: &str) -> f32 {
    let url = url.trim();
    if url.is_empty() {
        return EMPTY_URL_CREDIBILITY;
    }

    let host = host_of(url);
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let mut score = BASE_CREDIBILITY;

    let trusted_domain = TRUSTED_DOMAINS.iter().any(|d| host_matches(&host, d));
    let trusted_label = labels
        .last()
        .is_some_and(|tld| TRUSTED_LABELS.contains(tld));
    if trusted_domain || trusted_label || has_edu_or_gov_label(&labels) {
        score += TRUSTED_DOMAIN_BONUS;
    }

    if url.to_ascii_lowercase().starts_with("https://") {
        score += HTTPS_BONUS;
    }

    if has_edu_or_gov_label(&labels) {
        score += EDU_GOV_BONUS;
    }

    if host_matches(&host, REFERENCE_DOMAIN) {
        score += REFERENCE_DOMAIN_BONUS;
    }

    score.min(1.0)
}

/// Lowercased host of `url`, tolerating a missing scheme.
fn host_of(url: &str) -> String {
    let parsed = Url::parse(url)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| Url::parse(&format!("http://{url}")).ok());
    parsed
        .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        .unwrap_or_default()
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// `edu`/`gov` anywhere after the first label, so `mit.edu` and
/// `www.gov.uk` both count.
fn has_edu_or_gov_label(labels: &[&str]) -> bool {
    labels
        .iter()
        .skip(1)
        .any(|l| *l == "edu" || *l == "gov")
}
