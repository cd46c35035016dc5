//! Citation-count enrichment.
//!
//! Providers implement the [`CitationProvider`] trait and are tried in priority
//! order per record: DOI-keyed Semantic Scholar (with an internal Crossref
//! fallback), PMID-keyed iCite, then a free-text title search. A provider
//! returning `None` means "no answer", not an error; the chain moves on. Adding
//! or reordering sources is a data change in the provider list, not a
//! control-flow change.

mod crossref;
mod icite;
mod semantic;
mod title_search;

pub use crossref::CrossrefWorks;
pub use icite::ICiteProvider;
pub use semantic::SemanticScholarProvider;
pub use title_search::TitleSearchProvider;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tokio::time::sleep;
use tracing::debug;

use crate::config::FetchConfig;
use crate::models::{ArticleRecord, CitationSource};
use crate::utils::{HttpClient, ProgressObserver, RetryPolicy};

/// A citation count resolved by a provider, tagged with the answering source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CitationHit {
    pub count: u32,
    pub source: CitationSource,
}

/// One strategy for resolving a citation count.
#[async_trait]
pub trait CitationProvider: Send + Sync + std::fmt::Debug {
    /// Whether the record carries the key this provider needs
    fn applies_to(&self, record: &ArticleRecord) -> bool;

    /// Try to resolve a count. `None` means the source had no answer; the
    /// enricher falls through to the next provider.
    async fn lookup(&self, record: &ArticleRecord) -> Option<CitationHit>;
}

/// Outcome of a single citation-endpoint call.
pub(crate) enum EndpointReply {
    /// 2xx with a JSON body
    Json(Value),
    /// 429 responses persisted through the attempt budget
    RateLimited,
    /// Non-retryable status, exhausted connection errors, or unparseable body
    Unavailable,
}

/// GET a JSON endpoint, retrying only on rate limits and connection errors.
/// Citation sources treat any other status as immediately unavailable rather
/// than retrying it, unlike the E-utilities client.
pub(crate) async fn get_json(
    client: &HttpClient,
    url: &str,
    params: &[(&str, String)],
    policy: &RetryPolicy,
) -> EndpointReply {
    let max = policy.max_retries.max(1);

    for attempt in 0..max {
        match client.client().get(url).query(params).send().await {
            Ok(response) if response.status().is_success() => {
                return match response.json::<Value>().await {
                    Ok(value) => EndpointReply::Json(value),
                    Err(err) => {
                        debug!(url, error = %err, "citation endpoint body was not valid JSON");
                        EndpointReply::Unavailable
                    }
                };
            }
            Ok(response) if response.status() == StatusCode::TOO_MANY_REQUESTS => {
                if attempt + 1 < max {
                    let wait = policy
                        .base_delay
                        .mul_f64(policy.rate_limit_factor.powi(attempt as i32));
                    debug!(url, attempt = attempt + 1, ?wait, "citation endpoint rate limited");
                    sleep(wait).await;
                }
            }
            Ok(response) => {
                debug!(url, status = response.status().as_u16(), "citation endpoint unavailable");
                return EndpointReply::Unavailable;
            }
            Err(err) => {
                if attempt + 1 < max {
                    let wait = policy.base_delay.mul_f64(2f64.powi(attempt as i32));
                    debug!(url, attempt = attempt + 1, ?wait, error = %err, "citation request failed");
                    sleep(wait).await;
                } else {
                    debug!(url, error = %err, "citation request failed on final attempt");
                    return EndpointReply::Unavailable;
                }
            }
        }
    }

    EndpointReply::RateLimited
}

/// Runs the provider chain over each record, mutating `citation_count` and
/// `citation_source` in place. Re-running recomputes and overwrites.
pub struct CitationEnricher {
    providers: Vec<Box<dyn CitationProvider>>,
    delay: Duration,
    pause_every: usize,
}

impl CitationEnricher {
    /// Build the default chain: Semantic Scholar by DOI, iCite by PMID, then
    /// title search.
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        let providers: Vec<Box<dyn CitationProvider>> = vec![
            Box::new(SemanticScholarProvider::new(client.clone(), fetch)),
            Box::new(ICiteProvider::new(client.clone(), fetch)),
            Box::new(TitleSearchProvider::new(client, fetch)),
        ];
        Self {
            providers,
            delay: fetch.request_delay(),
            pause_every: fetch.citation_pause_every.max(1),
        }
    }

    /// Build a chain from explicit providers (for testing or custom orderings)
    pub fn with_providers(
        providers: Vec<Box<dyn CitationProvider>>,
        delay: Duration,
        pause_every: usize,
    ) -> Self {
        Self {
            providers,
            delay,
            pause_every: pause_every.max(1),
        }
    }

    /// Enrich each record independently. A record no provider answers for gets
    /// count 0 and the `none` tag. Sleeps the inter-record delay after each
    /// record, with a doubled pause every `pause_every` records.
    pub async fn enrich(&self, records: &mut [ArticleRecord], progress: &dyn ProgressObserver) {
        if records.is_empty() {
            return;
        }

        progress.begin("Fetching citations", records.len() as u64);

        for (index, record) in records.iter_mut().enumerate() {
            let mut hit = None;
            for provider in &self.providers {
                if !provider.applies_to(record) {
                    continue;
                }
                if let Some(found) = provider.lookup(record).await {
                    hit = Some(found);
                    break;
                }
            }

            match hit {
                Some(found) => {
                    record.citation_count = found.count;
                    record.citation_source = found.source;
                }
                None => {
                    record.citation_count = 0;
                    record.citation_source = CitationSource::None;
                }
            }

            progress.advance(1);
            sleep(self.delay).await;
            if (index + 1) % self.pause_every == 0 {
                sleep(self.delay * 2).await;
            }
        }

        progress.finish();
    }
}
