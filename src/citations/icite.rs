//! NIH iCite citation lookup, keyed by PMID.

use async_trait::async_trait;
use serde_json::Value;

use crate::citations::{get_json, CitationHit, CitationProvider, EndpointReply};
use crate::config::FetchConfig;
use crate::models::{ArticleRecord, CitationSource};
use crate::utils::{HttpClient, RetryPolicy};

const ICITE_API_BASE: &str = "https://icite.od.nih.gov/api/pubs";

const MAX_RETRIES: u32 = 3;

/// Secondary citation source: `GET {base}/{pmid}`, reading the nested
/// `data.citation_count` field.
#[derive(Debug)]
pub struct ICiteProvider {
    client: HttpClient,
    base_url: String,
    retry: RetryPolicy,
}

impl ICiteProvider {
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        Self {
            client,
            base_url: ICITE_API_BASE.to_string(),
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
impl CitationProvider for ICiteProvider {
    fn applies_to(&self, record: &ArticleRecord) -> bool {
        !record.pmid.is_empty()
    }

    async fn lookup(&self, record: &ArticleRecord) -> Option<CitationHit> {
        let url = format!("{}/{}", self.base_url, record.pmid);

        match get_json(&self.client, &url, &[], &self.retry).await {
            EndpointReply::Json(value) => {
                let count = value
                    .pointer("/data/citation_count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as u32;
                Some(CitationHit {
                    count,
                    source: CitationSource::Icite,
                })
            }
            EndpointReply::RateLimited | EndpointReply::Unavailable => None,
        }
    }
}
