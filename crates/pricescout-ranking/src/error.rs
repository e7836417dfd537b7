use pricescout_core::{ArgumentError, SourceWarning};
use pricescout_scraper::ScraperError;
use thiserror::Error;

/// Why a search produced no response document.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    InvalidArgument(#[from] ArgumentError),

    #[error("no listings obtained from any source: {}", summarize(.warnings))]
    AggregateFailure { warnings: Vec<SourceWarning> },

    #[error("failed to set up sources: {0}")]
    Setup(#[from] ScraperError),

    #[error("failed to set up relevance filter: {0}")]
    RelevanceSetup(#[from] RelevanceError),
}

/// Why the relevance classifier could not be used. Never surfaced to the
/// caller; the filter fails open.
#[derive(Debug, Error)]
pub enum RelevanceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned HTTP {status}")]
    Status { status: u16 },

    #[error("classifier timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("classifier response not understood: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("no index array in classifier reply: {excerpt}")]
    NoArray { excerpt: String },

    #[error("index array in classifier reply is not valid JSON: {0}")]
    InvalidArray(#[source] serde_json::Error),

    #[error("every index in the classifier reply was out of range")]
    NoValidIndices,
}

/// `source: error | source: error`
#[must_use]
pub fn summarize(warnings: &[SourceWarning]) -> String {
    warnings
        .iter()
        .map(|w| format!("{}: {}", w.source, w.error))
        .collect::<Vec<_>>()
        .join(" | ")
}
