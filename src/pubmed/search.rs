//! Identifier pagination over the esearch endpoint.

use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::utils::{HttpClient, ProgressObserver, RetryPolicy};

const PUBMED_ESEARCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi";

/// Sentinel for "fetch everything the search matches".
pub const ALL_RESULTS: i64 = -1;

#[derive(Debug, Deserialize)]
struct ESearchEnvelope {
    esearchresult: Option<ESearchPage>,
}

#[derive(Debug, Default, Deserialize)]
struct ESearchPage {
    #[serde(default)]
    count: String,
    #[serde(default)]
    idlist: Vec<String>,
}

/// Collects PMIDs matching a query, paging under a result cap.
#[derive(Debug, Clone)]
pub struct IdSearcher {
    client: HttpClient,
    base_url: String,
    delay: Duration,
    retry: RetryPolicy,
}

impl IdSearcher {
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        Self {
            client,
            base_url: PUBMED_ESEARCH_URL.to_string(),
            delay: fetch.request_delay(),
            retry: fetch.eutils_retry_policy(),
        }
    }

    /// Point at a different esearch endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn fetch_page(&self, query: &str, retmax: usize, retstart: usize) -> Option<ESearchPage> {
        let params = [
            ("db", "pubmed".to_string()),
            ("term", query.to_string()),
            ("retmax", retmax.to_string()),
            ("retstart", retstart.to_string()),
            ("retmode", "json".to_string()),
            ("sort", "date".to_string()),
        ];

        let response = match self
            .client
            .get_with_retry(&self.base_url, &params, &self.retry)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(retstart, error = %err, "esearch page request failed");
                return None;
            }
        };

        match response.json::<ESearchEnvelope>().await {
            Ok(envelope) => envelope.esearchresult,
            Err(err) => {
                warn!(retstart, error = %err, "esearch page response was not valid JSON");
                None
            }
        }
    }

    /// Collect up to `max_results` matching PMIDs ([`ALL_RESULTS`] for no cap),
    /// paging in `page_size`-sized windows in server (date-sorted) order.
    ///
    /// Never errors: a failed probe returns an empty list, and a failed page
    /// returns whatever has been collected so far.
    pub async fn collect_ids(
        &self,
        query: &str,
        max_results: i64,
        page_size: usize,
        progress: &dyn ProgressObserver,
    ) -> Vec<String> {
        // Probe request to learn the server-reported total match count.
        let Some(probe) = self.fetch_page(query, 1, 0).await else {
            warn!("failed to get initial results count; continuing with no results");
            return Vec::new();
        };
        let total: u64 = probe.count.parse().unwrap_or(0);
        info!(total, "server reports matching articles");

        if total == 0 {
            return Vec::new();
        }

        let cap = if max_results == ALL_RESULTS {
            total as usize
        } else {
            max_results.max(0) as usize
        };
        let page_size = page_size.max(1);

        progress.begin("Fetching PubMed IDs", cap.min(total as usize) as u64);

        let mut ids: Vec<String> = Vec::new();
        let mut offset = 0usize;

        while ids.len() < cap {
            let to_fetch = page_size.min(cap - ids.len());
            let Some(page) = self.fetch_page(query, to_fetch, offset).await else {
                warn!(offset, "page fetch failed; returning IDs collected so far");
                break;
            };

            let got = page.idlist.len();
            ids.extend(page.idlist);
            progress.advance(got as u64);

            // A short page means the server ran out of results.
            if got < to_fetch {
                break;
            }
            offset += got;

            sleep(self.delay).await;
        }

        progress.finish();
        ids.truncate(cap);
        ids
    }
}
