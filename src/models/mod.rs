//! Core data structures shared across pipeline stages.

mod article;

pub use article::{ArticleRecord, CitationSource};
