//! # pubharvest
//!
//! Harvests bibliographic records for a journal from PubMed, fills in abstracts,
//! enriches them with citation counts from secondary sources, and filters the
//! result by keyword for JSON export.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures ([`ArticleRecord`], [`CitationSource`])
//! - [`pubmed`]: E-utilities clients (identifier pagination, summary batches,
//!   abstract reconciliation)
//! - [`citations`]: Citation-count providers tried in priority order per record
//! - [`pipeline`]: The sequential stage orchestrator
//! - [`utils`]: HTTP retry client, progress observer, text helpers
//! - [`config`], [`query`], [`filter`], [`output`]: configuration, search query
//!   construction, keyword filtering, and report persistence
//!
//! Every network stage degrades on failure instead of aborting the run: a failed
//! batch is skipped, a missing abstract stays empty, and an unanswered citation
//! lookup falls through to the next source.

pub mod citations;
pub mod config;
pub mod filter;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod pubmed;
pub mod query;
pub mod utils;

// Re-export commonly used types
pub use models::{ArticleRecord, CitationSource};
pub use pipeline::Harvester;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
