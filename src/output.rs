//! Result persistence.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::ArticleRecord;

/// The persisted harvest result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestReport {
    /// The esearch term that was used
    pub search_query: String,

    /// Number of identifiers collected (before keyword filtering)
    pub num_total_articles: usize,

    /// Keywords the filter applied
    pub keywords: Vec<String>,

    /// Number of records surviving the filter
    pub num_relevant_articles: usize,

    /// The filtered records
    pub relevant_articles: Vec<ArticleRecord>,
}

impl HarvestReport {
    pub fn new(
        search_query: String,
        num_total_articles: usize,
        keywords: Vec<String>,
        relevant_articles: Vec<ArticleRecord>,
    ) -> Self {
        Self {
            search_query,
            num_total_articles,
            keywords,
            num_relevant_articles: relevant_articles.len(),
            relevant_articles,
        }
    }
}

/// Write the report as pretty-printed JSON, creating parent directories as
/// needed. This is the one place a failure terminates the run.
pub fn save_report(path: &Path, report: &HarvestReport) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create output directory {}", parent.display()))?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), report)
        .with_context(|| format!("failed to write report to {}", path.display()))?;

    info!(path = %path.display(), "results saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_relevant_articles() {
        let records = vec![ArticleRecord::new("1"), ArticleRecord::new("2")];
        let report = HarvestReport::new(
            "query".to_string(),
            10,
            vec!["llm".to_string()],
            records,
        );
        assert_eq!(report.num_total_articles, 10);
        assert_eq!(report.num_relevant_articles, 2);
    }

    #[test]
    fn test_report_serialized_field_names() {
        let report = HarvestReport::new("q".to_string(), 1, vec![], vec![]);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["search_query"], "q");
        assert_eq!(json["num_total_articles"], 1);
        assert_eq!(json["num_relevant_articles"], 0);
        assert!(json["relevant_articles"].as_array().unwrap().is_empty());
        assert!(json["keywords"].as_array().unwrap().is_empty());
    }
}
