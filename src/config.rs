//! Configuration management.
//!
//! All tunables live in an explicit [`HarvestConfig`] value passed into the
//! pipeline constructor; there is no ambient global state. Defaults match the
//! reference deployment (Radiology: Artificial Intelligence, language-model
//! keywords) and can be overridden from a TOML file and CLI flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::utils::RetryPolicy;

/// Top-level harvest configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Journal title to search
    pub journal: String,

    /// Start year for the search range
    pub from_year: String,

    /// End year for the search range (a large value includes future years)
    pub to_year: String,

    /// Exclude reviews, editorials, letters, and comments
    pub research_only: bool,

    /// Maximum articles to fetch; -1 fetches everything the search matches
    pub max_articles: i64,

    /// Whether to run the citation enrichment stage
    pub fetch_citations: bool,

    /// Keywords matched (case-insensitively) against title + abstract
    pub keywords: Vec<String>,

    /// Output JSON path
    pub output: PathBuf,

    /// Network tunables
    pub fetch: FetchConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            journal: "Radiol Artif Intell".to_string(),
            from_year: "2019".to_string(),
            to_year: "3000".to_string(),
            research_only: true,
            max_articles: -1,
            fetch_citations: true,
            keywords: default_keywords(),
            output: PathBuf::from("outputs/radiol_ai_lang_model_papers.json"),
            fetch: FetchConfig::default(),
        }
    }
}

fn default_keywords() -> Vec<String> {
    [
        "language model",
        "llm",
        "gpt",
        "bert",
        "transformer",
        "nlp",
        "natural language processing",
        "chatgpt",
        "claude",
        "prompt",
        "llama",
        "mistral",
        "gemini",
        "text-to-text",
        "text generation",
        "text embedding",
        "foundation model",
        "generative ai",
        "generative model",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Batch sizes, delays, and retry tunables shared by the fetch stages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Identifiers per esearch page and per esummary batch
    pub batch_size: usize,

    /// Records per efetch abstract batch
    pub abstract_batch_size: usize,

    /// Fixed delay between requests (NCBI allows 3 req/s anonymously)
    pub request_delay_ms: u64,

    /// Per-request timeout
    pub timeout_secs: u64,

    /// Attempt budget for the E-utilities endpoints
    pub max_retries: u32,

    /// Exponential backoff base shared by all retry loops
    pub base_delay_ms: u64,

    /// Extra pause after this many citation lookups
    pub citation_pause_every: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            abstract_batch_size: 10,
            request_delay_ms: 340,
            timeout_secs: 30,
            max_retries: 5,
            base_delay_ms: 1000,
            citation_pause_every: 5,
        }
    }
}

impl FetchConfig {
    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Retry policy for the esearch/esummary/efetch endpoints. Rate-limit backoff
    /// uses factor 3, more aggressive than the generic factor 2.
    pub fn eutils_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, self.base_delay(), 3.0)
    }
}

/// Load configuration from a TOML file. Missing keys fall back to defaults.
pub fn load_config(path: &Path) -> anyhow::Result<HarvestConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config = toml::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_deployment() {
        let config = HarvestConfig::default();
        assert_eq!(config.journal, "Radiol Artif Intell");
        assert_eq!(config.max_articles, -1);
        assert!(config.research_only);
        assert!(config.fetch_citations);
        assert!(config.keywords.iter().any(|k| k == "language model"));

        assert_eq!(config.fetch.batch_size, 100);
        assert_eq!(config.fetch.abstract_batch_size, 10);
        assert_eq!(config.fetch.request_delay_ms, 340);
        assert_eq!(config.fetch.max_retries, 5);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: HarvestConfig = toml::from_str(
            r#"
            journal = "Nature"
            max_articles = 50

            [fetch]
            batch_size = 20
            "#,
        )
        .unwrap();

        assert_eq!(config.journal, "Nature");
        assert_eq!(config.max_articles, 50);
        assert_eq!(config.fetch.batch_size, 20);
        assert_eq!(config.fetch.abstract_batch_size, 10);
        assert_eq!(config.from_year, "2019");
    }

    #[test]
    fn test_eutils_retry_policy() {
        let policy = FetchConfig::default().eutils_retry_policy();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.base_delay, Duration::from_secs(1));
        assert_eq!(policy.rate_limit_factor, 3.0);
    }
}
