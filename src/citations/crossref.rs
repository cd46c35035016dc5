//! Crossref works lookup, the internal fallback for the DOI-keyed provider.

use serde_json::Value;

use crate::citations::{get_json, EndpointReply};
use crate::config::FetchConfig;
use crate::utils::{HttpClient, RetryPolicy};

const CROSSREF_API_BASE: &str = "https://api.crossref.org";

const MAX_RETRIES: u32 = 2;

/// `GET /works/{doi}`, reading `message["is-referenced-by-count"]`.
#[derive(Debug)]
pub struct CrossrefWorks {
    client: HttpClient,
    base_url: String,
    retry: RetryPolicy,
}

impl CrossrefWorks {
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        Self {
            client,
            base_url: CROSSREF_API_BASE.to_string(),
            retry: RetryPolicy::new(MAX_RETRIES, fetch.base_delay(), 2.0),
        }
    }

    /// Point at a different API base (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Citation count for a (already normalized) DOI, or `None` when Crossref
    /// has no answer.
    pub async fn citation_count(&self, doi: &str) -> Option<u32> {
        if doi.is_empty() {
            return None;
        }

        let url = format!("{}/works/{}", self.base_url, doi);
        match get_json(&self.client, &url, &[], &self.retry).await {
            EndpointReply::Json(value) => Some(
                value
                    .pointer("/message/is-referenced-by-count")
                    .and_then(Value::as_u64)
                    .unwrap_or(0) as u32,
            ),
            EndpointReply::RateLimited | EndpointReply::Unavailable => None,
        }
    }
}
