//! Utility modules supporting the harvest pipeline:
//!
//! - [`HttpClient`]: shared HTTP client with bounded retry and exponential backoff
//! - [`RetryPolicy`] / [`FetchError`]: retry configuration and failure taxonomy
//! - [`ProgressObserver`]: injected progress callback, no-op by default
//! - [`collapse_whitespace`] / [`normalize_doi`]: field normalization helpers

mod http;
mod progress;
mod text;

pub use http::{FetchError, HttpClient, RetryPolicy};
pub use progress::{NoopProgress, ProgressObserver};
pub use text::{collapse_whitespace, normalize_doi};
