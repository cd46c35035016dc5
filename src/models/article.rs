//! Article record model, filled in progressively by the pipeline stages.

use serde::{Deserialize, Serialize};

/// Which enrichment source supplied the citation count.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationSource {
    /// Semantic Scholar, keyed by DOI
    SemanticScholar,
    /// Crossref works endpoint, keyed by DOI (fallback of the DOI lookup)
    Crossref,
    /// NIH iCite, keyed by PMID
    Icite,
    /// Semantic Scholar free-text search on title plus first author surname
    TitleSearch,
    /// No source answered
    #[default]
    None,
}

impl CitationSource {
    /// Returns the serialized tag for this source
    pub fn tag(&self) -> &'static str {
        match self {
            CitationSource::SemanticScholar => "semantic_scholar",
            CitationSource::Crossref => "crossref",
            CitationSource::Icite => "icite",
            CitationSource::TitleSearch => "title_search",
            CitationSource::None => "none",
        }
    }
}

impl std::fmt::Display for CitationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// One publication, as exported to the result JSON.
///
/// Records are created by the summary fetcher with an empty abstract and zero
/// citations. The abstract reconciler is the only writer of `abstract_text`; the
/// citation enricher is the only writer of `citation_count`/`citation_source`.
/// `pmid` is immutable once assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// PubMed identifier
    pub pmid: String,

    /// Title, whitespace-collapsed; may be empty
    pub title: String,

    /// Full journal display name
    pub journal: String,

    /// Publication date as reported by the source (free-form, not parsed)
    pub pub_date: String,

    /// DOI with any `doi:` prefix stripped; empty string means absent
    pub doi: String,

    /// Canonical article URL derived from the PMID
    pub url: String,

    /// Author display names, in source order
    pub authors: Vec<String>,

    /// Abstract text; stays empty when no source yields any
    #[serde(rename = "abstract", default)]
    pub abstract_text: String,

    /// Citation count; 0 when no source answered
    #[serde(default)]
    pub citation_count: u32,

    /// Which source supplied the citation count
    #[serde(default)]
    pub citation_source: CitationSource,
}

impl ArticleRecord {
    /// Create an empty record for a PMID. The URL is derived from the identifier.
    pub fn new(pmid: impl Into<String>) -> Self {
        let pmid = pmid.into();
        let url = if pmid.is_empty() {
            String::new()
        } else {
            format!("https://pubmed.ncbi.nlm.nih.gov/{}/", pmid)
        };
        Self {
            pmid,
            title: String::new(),
            journal: String::new(),
            pub_date: String::new(),
            doi: String::new(),
            url,
            authors: Vec::new(),
            abstract_text: String::new(),
            citation_count: 0,
            citation_source: CitationSource::None,
        }
    }

    /// Last whitespace token of the first author's display name, used by the
    /// title-search citation lookup. PubMed summary names read "Smith J", so this
    /// yields the initials token for such input; inherited from the reference
    /// behavior rather than corrected.
    pub fn first_author_surname(&self) -> Option<&str> {
        self.authors.first()?.split_whitespace().last()
    }
}
