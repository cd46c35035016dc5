//! Semantic Scholar citation lookup, keyed by DOI.

use async_trait::async_trait;
use serde_json::Value;

use crate::citations::{get_json, CitationHit, CitationProvider, CrossrefWorks, EndpointReply};
use crate::config::FetchConfig;
use crate::models::{ArticleRecord, CitationSource};
use crate::utils::{normalize_doi, HttpClient, RetryPolicy};

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

const MAX_RETRIES: u32 = 3;

/// Primary citation source: `GET /paper/DOI:{doi}?fields=citationCount`.
///
/// Rate-limit exhaustion yields no answer; any other failure falls back to the
/// Crossref works endpoint, whose answer is tagged [`CitationSource::Crossref`].
#[derive(Debug)]
pub struct SemanticScholarProvider {
    client: HttpClient,
    base_url: String,
    retry: RetryPolicy,
    fallback: CrossrefWorks,
}

impl SemanticScholarProvider {
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        Self {
            fallback: CrossrefWorks::new(client.clone(), fetch),
            client,
            base_url: SEMANTIC_API_BASE.to_string(),
            retry: RetryPolicy::new(MAX_RETRIES, fetch.base_delay(), 2.0),
        }
    }

    /// Point at a different API base (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replace the Crossref fallback (for testing)
    pub fn with_fallback(mut self, fallback: CrossrefWorks) -> Self {
        self.fallback = fallback;
        self
    }
}

#[async_trait]
impl CitationProvider for SemanticScholarProvider {
    fn applies_to(&self, record: &ArticleRecord) -> bool {
        !record.doi.is_empty()
    }

    async fn lookup(&self, record: &ArticleRecord) -> Option<CitationHit> {
        let doi = normalize_doi(&record.doi);
        if doi.is_empty() {
            return None;
        }

        let url = format!("{}/paper/DOI:{}", self.base_url, doi);
        let params = [("fields", "citationCount".to_string())];

        match get_json(&self.client, &url, &params, &self.retry).await {
            EndpointReply::Json(value) => {
                // A successful response without the field counts as an answer of 0.
                let count = value
                    .get("citationCount")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as u32;
                Some(CitationHit {
                    count,
                    source: CitationSource::SemanticScholar,
                })
            }
            EndpointReply::RateLimited => None,
            EndpointReply::Unavailable => {
                self.fallback.citation_count(&doi).await.map(|count| CitationHit {
                    count,
                    source: CitationSource::Crossref,
                })
            }
        }
    }
}
