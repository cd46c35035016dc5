//! Metadata batch fetching via the esummary endpoint.

use std::time::Duration;

use serde_json::Value;
use tokio::time::sleep;
use tracing::warn;

use crate::config::FetchConfig;
use crate::models::ArticleRecord;
use crate::utils::{
    collapse_whitespace, normalize_doi, FetchError, HttpClient, ProgressObserver, RetryPolicy,
};

const PUBMED_ESUMMARY_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esummary.fcgi";

#[derive(Debug, thiserror::Error)]
enum SummaryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read summary JSON: {0}")]
    Body(String),

    #[error("summary response missing {0}")]
    Malformed(&'static str),
}

/// Converts batches of PMIDs into normalized [`ArticleRecord`]s.
#[derive(Debug, Clone)]
pub struct SummaryFetcher {
    client: HttpClient,
    base_url: String,
    delay: Duration,
    retry: RetryPolicy,
}

impl SummaryFetcher {
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        Self {
            client,
            base_url: PUBMED_ESUMMARY_URL.to_string(),
            delay: fetch.request_delay(),
            retry: fetch.eutils_retry_policy(),
        }
    }

    /// Point at a different esummary endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch article records for `ids` in contiguous batches of at most
    /// `batch_size`. A failed batch is logged and skipped; a malformed entry
    /// skips only that identifier. Output preserves batch order, and within a
    /// batch the response's identifier order.
    ///
    /// Every returned record has an empty abstract; the abstract reconciler owns
    /// that field.
    pub async fn fetch_details(
        &self,
        ids: &[String],
        batch_size: usize,
        progress: &dyn ProgressObserver,
    ) -> Vec<ArticleRecord> {
        if ids.is_empty() {
            return Vec::new();
        }

        progress.begin("Fetching article details", ids.len() as u64);
        let mut records = Vec::new();

        for batch in ids.chunks(batch_size.max(1)) {
            match self.fetch_batch(batch).await {
                Ok(mut batch_records) => records.append(&mut batch_records),
                Err(err) => {
                    warn!(batch_len = batch.len(), error = %err, "summary batch failed; skipping");
                }
            }
            progress.advance(batch.len() as u64);
            sleep(self.delay).await;
        }

        progress.finish();
        records
    }

    async fn fetch_batch(&self, batch: &[String]) -> Result<Vec<ArticleRecord>, SummaryError> {
        let params = [
            ("db", "pubmed".to_string()),
            ("id", batch.join(",")),
            ("retmode", "json".to_string()),
        ];

        let response = self
            .client
            .get_with_retry(&self.base_url, &params, &self.retry)
            .await?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| SummaryError::Body(err.to_string()))?;

        let result = body
            .get("result")
            .ok_or(SummaryError::Malformed("result"))?;
        let uids = result
            .get("uids")
            .and_then(Value::as_array)
            .ok_or(SummaryError::Malformed("result.uids"))?;

        let mut records = Vec::new();
        for uid in uids {
            let Some(pmid) = uid.as_str() else {
                continue;
            };
            match build_record(pmid, result.get(pmid)) {
                Ok(record) => records.push(record),
                Err(err) => warn!(pmid, error = %err, "skipping malformed summary entry"),
            }
        }

        Ok(records)
    }
}

fn build_record(pmid: &str, entry: Option<&Value>) -> Result<ArticleRecord, SummaryError> {
    let entry = entry
        .and_then(Value::as_object)
        .ok_or(SummaryError::Malformed("uid entry"))?;

    let text = |key: &str| entry.get(key).and_then(Value::as_str).unwrap_or("");

    let mut record = ArticleRecord::new(pmid);
    record.title = collapse_whitespace(text("title"));
    record.journal = text("fulljournalname").to_string();
    record.pub_date = text("pubdate").to_string();
    record.doi = normalize_doi(text("elocationid"));
    record.authors = entry
        .get("authors")
        .and_then(Value::as_array)
        .map(|authors| {
            authors
                .iter()
                .filter_map(|author| author.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_build_record_maps_fields() {
        let entry = json!({
            "title": "Deep  learning\n in radiology",
            "fulljournalname": "Radiology: Artificial Intelligence",
            "pubdate": "2024 Jan",
            "elocationid": "doi: 10.1148/ryai.2024",
            "authors": [{"name": "Smith J"}, {"name": "Doe A"}]
        });

        let record = build_record("123", Some(&entry)).unwrap();
        assert_eq!(record.pmid, "123");
        assert_eq!(record.title, "Deep learning in radiology");
        assert_eq!(record.journal, "Radiology: Artificial Intelligence");
        assert_eq!(record.pub_date, "2024 Jan");
        assert_eq!(record.doi, "10.1148/ryai.2024");
        assert_eq!(record.url, "https://pubmed.ncbi.nlm.nih.gov/123/");
        assert_eq!(record.authors, vec!["Smith J", "Doe A"]);
        assert_eq!(record.abstract_text, "");
    }

    #[test]
    fn test_build_record_tolerates_missing_fields() {
        let record = build_record("7", Some(&json!({}))).unwrap();
        assert_eq!(record.pmid, "7");
        assert_eq!(record.title, "");
        assert_eq!(record.doi, "");
        assert!(record.authors.is_empty());
    }

    #[test]
    fn test_build_record_rejects_non_object_entry() {
        assert!(build_record("7", Some(&json!("error"))).is_err());
        assert!(build_record("7", None).is_err());
    }
}
