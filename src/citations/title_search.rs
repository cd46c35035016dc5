//! Last-resort citation lookup via free-text title search.

use async_trait::async_trait;
use serde_json::Value;

use crate::citations::{get_json, CitationHit, CitationProvider, EndpointReply};
use crate::config::FetchConfig;
use crate::models::{ArticleRecord, CitationSource};
use crate::utils::{HttpClient, RetryPolicy};

const SEMANTIC_API_BASE: &str = "https://api.semanticscholar.org/graph/v1";

const MAX_RETRIES: u32 = 2;

/// Searches Semantic Scholar for "{title} {first author surname}" with a result
/// limit of 1 and takes the top hit's citation count, if present.
///
/// First-hit-wins matching has no confidence threshold: a near-match can attach
/// a different paper's count. Inherited from the reference source.
#[derive(Debug)]
pub struct TitleSearchProvider {
    client: HttpClient,
    base_url: String,
    retry: RetryPolicy,
}

impl TitleSearchProvider {
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        Self {
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
}

#[async_trait]
impl CitationProvider for TitleSearchProvider {
    fn applies_to(&self, record: &ArticleRecord) -> bool {
        !record.title.is_empty()
    }

    async fn lookup(&self, record: &ArticleRecord) -> Option<CitationHit> {
        let mut query = record.title.clone();
        if let Some(surname) = record.first_author_surname() {
            query.push(' ');
            query.push_str(surname);
        }

        let url = format!("{}/paper/search", self.base_url);
        let params = [
            ("query", query),
            ("fields", "citationCount".to_string()),
            ("limit", "1".to_string()),
        ];

        match get_json(&self.client, &url, &params, &self.retry).await {
            EndpointReply::Json(value) => value
                .pointer("/data/0/citationCount")
                .and_then(Value::as_u64)
                .map(|count| CitationHit {
                    count: count as u32,
                    source: CitationSource::TitleSearch,
                }),
            EndpointReply::RateLimited | EndpointReply::Unavailable => None,
        }
    }
}
