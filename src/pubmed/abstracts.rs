//! Abstract reconciliation from the efetch endpoint.
//!
//! The primary path requests the XML encoding for a whole batch, which preserves
//! structured abstracts (labeled Background/Methods/... sections). Records the
//! XML yields nothing for fall back to an individual plain-text request with
//! marker-based extraction.

use std::collections::HashMap;
use std::time::Duration;

use quick_xml::de::from_str;
use serde::Deserialize;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::FetchConfig;
use crate::models::ArticleRecord;
use crate::utils::{HttpClient, ProgressObserver, RetryPolicy};

const PUBMED_EFETCH_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils/efetch.fcgi";

/// Section headers that follow the abstract in the plain-text encoding. "\n\n20"
/// catches the date line that opens the citation block.
const TRAILING_MARKERS: [&str; 5] = ["\n\nMeSH", "\n\nPMID", "\n\nCopyright", "\n\nAuthor", "\n\n20"];

/// Fills the `abstract` field of article records in place.
#[derive(Debug, Clone)]
pub struct AbstractFetcher {
    client: HttpClient,
    base_url: String,
    delay: Duration,
    retry: RetryPolicy,
}

impl AbstractFetcher {
    pub fn new(client: HttpClient, fetch: &FetchConfig) -> Self {
        Self {
            client,
            base_url: PUBMED_EFETCH_URL.to_string(),
            delay: fetch.request_delay(),
            retry: fetch.eutils_retry_policy(),
        }
    }

    /// Point at a different efetch endpoint (for testing)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fill abstracts for all records with an empty abstract, batching requests.
    /// Records that already carry text are left untouched, so re-running is a
    /// no-op for them. A record no source yields text for keeps `""`; that is a
    /// valid terminal state, not an error.
    pub async fn fill_abstracts(
        &self,
        records: &mut [ArticleRecord],
        batch_size: usize,
        progress: &dyn ProgressObserver,
    ) {
        if records.is_empty() {
            return;
        }

        info!(count = records.len(), "fetching abstracts");
        progress.begin("Fetching abstracts", records.len() as u64);

        for batch in records.chunks_mut(batch_size.max(1)) {
            let pending: Vec<String> = batch
                .iter()
                .filter(|record| record.abstract_text.is_empty())
                .map(|record| record.pmid.clone())
                .collect();

            if pending.is_empty() {
                progress.advance(batch.len() as u64);
                continue;
            }

            let by_pmid = match self.fetch_structured(&pending).await {
                Ok(map) => map,
                Err(err) => {
                    warn!(error = %err, "structured abstract batch failed; falling back to plain text per record");
                    HashMap::new()
                }
            };

            for record in batch.iter_mut() {
                if !record.abstract_text.is_empty() {
                    continue;
                }
                if let Some(text) = by_pmid.get(&record.pmid) {
                    if !text.is_empty() {
                        record.abstract_text = text.clone();
                        continue;
                    }
                }
                if let Some(text) = self.fetch_plain_text(&record.pmid).await {
                    record.abstract_text = text;
                }
                sleep(self.delay).await;
            }

            progress.advance(batch.len() as u64);
            sleep(self.delay).await;
        }

        progress.finish();
    }

    async fn fetch_structured(&self, pmids: &[String]) -> Result<HashMap<String, String>, String> {
        let params = [
            ("db", "pubmed".to_string()),
            ("id", pmids.join(",")),
            ("rettype", "abstract".to_string()),
            ("retmode", "xml".to_string()),
        ];

        let response = self
            .client
            .get_with_retry(&self.base_url, &params, &self.retry)
            .await
            .map_err(|err| err.to_string())?;
        let xml = response.text().await.map_err(|err| err.to_string())?;

        parse_structured_abstracts(&xml).map_err(|err| format!("XML parse error: {}", err))
    }

    async fn fetch_plain_text(&self, pmid: &str) -> Option<String> {
        let params = [
            ("db", "pubmed".to_string()),
            ("id", pmid.to_string()),
            ("rettype", "abstract".to_string()),
            ("retmode", "text".to_string()),
        ];

        let response = match self
            .client
            .get_with_retry(&self.base_url, &params, &self.retry)
            .await
        {
            Ok(response) => response,
            Err(err) => {
                warn!(pmid, error = %err, "plain-text abstract request failed");
                return None;
            }
        };

        match response.text().await {
            Ok(body) => Some(extract_abstract_from_text(&body)),
            Err(err) => {
                warn!(pmid, error = %err, "failed to read plain-text abstract body");
                None
            }
        }
    }
}

/// Parse an efetch XML response into a PMID → abstract map. Labeled sections are
/// concatenated as `"{label}: {text}"` and joined by single spaces; an article
/// without an abstract node maps to an empty string.
pub fn parse_structured_abstracts(
    xml: &str,
) -> Result<HashMap<String, String>, quick_xml::DeError> {
    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct PubmedArticleSet {
        #[serde(rename = "PubmedArticle", default)]
        articles: Vec<PubmedArticle>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct PubmedArticle {
        MedlineCitation: Option<MedlineCitation>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct MedlineCitation {
        PMID: Option<Pmid>,
        Article: Option<Article>,
    }

    #[derive(Debug, Deserialize)]
    struct Pmid {
        #[serde(rename = "$text")]
        id: String,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct Article {
        Abstract: Option<AbstractNode>,
    }

    #[derive(Debug, Deserialize)]
    #[allow(non_snake_case)]
    struct AbstractNode {
        #[serde(rename = "AbstractText", default)]
        sections: Vec<AbstractSection>,
    }

    #[derive(Debug, Deserialize)]
    struct AbstractSection {
        #[serde(rename = "@Label")]
        label: Option<String>,
        #[serde(rename = "$text")]
        text: Option<String>,
    }

    let set: PubmedArticleSet = from_str(xml)?;
    let mut abstracts = HashMap::new();

    for article in set.articles {
        let Some(citation) = article.MedlineCitation else {
            continue;
        };
        let Some(pmid) = citation.PMID.map(|p| p.id) else {
            continue;
        };

        let parts: Vec<String> = citation
            .Article
            .and_then(|a| a.Abstract)
            .map(|node| {
                node.sections
                    .into_iter()
                    .filter_map(|section| {
                        let text = section.text?;
                        if text.is_empty() {
                            return None;
                        }
                        match section.label {
                            Some(label) if !label.is_empty() => {
                                Some(format!("{}: {}", label, text))
                            }
                            _ => Some(text),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        abstracts.insert(pmid, parts.join(" "));
    }

    Ok(abstracts)
}

/// Extract the abstract from the plain-text efetch encoding: everything after the
/// first literal "Abstract", truncated at the first trailing-section marker, with
/// lines stripped and joined by single spaces.
pub fn extract_abstract_from_text(body: &str) -> String {
    let Some(idx) = body.find("Abstract") else {
        return String::new();
    };

    let mut tail = body[idx + "Abstract".len()..].trim();
    for marker in TRAILING_MARKERS {
        if let Some(pos) = tail.find(marker) {
            tail = &tail[..pos];
        }
    }

    tail.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
