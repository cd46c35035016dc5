//! PubMed E-utilities clients.
//!
//! Three sequential stages, each tolerant of partial failure:
//!
//! - [`IdSearcher`]: pages the esearch endpoint to collect matching PMIDs
//! - [`SummaryFetcher`]: turns PMID batches into [`ArticleRecord`]s via esummary
//! - [`AbstractFetcher`]: fills abstracts from efetch XML, falling back to the
//!   plain-text encoding per record
//!
//! [`ArticleRecord`]: crate::models::ArticleRecord

mod abstracts;
mod search;
mod summary;

pub use abstracts::AbstractFetcher;
pub use search::{IdSearcher, ALL_RESULTS};
pub use summary::SummaryFetcher;
