//! The sequential harvest pipeline.
//!
//! Data flows one way: identifier pagination → summary batches → abstract
//! reconciliation → citation enrichment → keyword filter. Each stage receives
//! the records by exclusive reference and is the sole mutator of the fields it
//! owns. Network failures degrade to partial output; nothing in here aborts
//! the run.

use tracing::info;

use crate::citations::CitationEnricher;
use crate::config::HarvestConfig;
use crate::filter::filter_by_keywords;
use crate::output::HarvestReport;
use crate::pubmed::{AbstractFetcher, IdSearcher, SummaryFetcher};
use crate::query::build_search_query;
use crate::utils::{HttpClient, ProgressObserver};

/// Owns the configured pipeline stages and runs them in order.
pub struct Harvester {
    config: HarvestConfig,
    searcher: IdSearcher,
    summaries: SummaryFetcher,
    abstracts: AbstractFetcher,
    citations: CitationEnricher,
}

impl Harvester {
    pub fn new(config: HarvestConfig) -> anyhow::Result<Self> {
        let client = HttpClient::new(config.fetch.timeout())?;
        Ok(Self {
            searcher: IdSearcher::new(client.clone(), &config.fetch),
            summaries: SummaryFetcher::new(client.clone(), &config.fetch),
            abstracts: AbstractFetcher::new(client.clone(), &config.fetch),
            citations: CitationEnricher::new(client, &config.fetch),
            config,
        })
    }

    /// The esearch term this harvester will use.
    pub fn search_query(&self) -> String {
        build_search_query(
            &self.config.journal,
            &self.config.from_year,
            &self.config.to_year,
            self.config.research_only,
        )
    }

    /// Run the full pipeline and return the filtered report. Citation
    /// enrichment runs only after abstracts are filled, and only when enabled.
    pub async fn run(&self, progress: &dyn ProgressObserver) -> HarvestReport {
        let query = self.search_query();
        info!(%query, "searching PubMed");

        let ids = self
            .searcher
            .collect_ids(
                &query,
                self.config.max_articles,
                self.config.fetch.batch_size,
                progress,
            )
            .await;
        info!(count = ids.len(), "retrieved PubMed IDs");

        if ids.is_empty() {
            return HarvestReport::new(query, 0, self.config.keywords.clone(), Vec::new());
        }

        let mut records = self
            .summaries
            .fetch_details(&ids, self.config.fetch.batch_size, progress)
            .await;
        info!(count = records.len(), "retrieved article details");

        self.abstracts
            .fill_abstracts(&mut records, self.config.fetch.abstract_batch_size, progress)
            .await;

        if self.config.fetch_citations {
            self.citations.enrich(&mut records, progress).await;
        }

        let relevant = filter_by_keywords(records, &self.config.keywords);
        info!(count = relevant.len(), "records matched at least one keyword");

        HarvestReport::new(query, ids.len(), self.config.keywords.clone(), relevant)
    }
}
