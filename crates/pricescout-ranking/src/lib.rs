//! Ranking and orchestration for pricescout.
//!
//! The pipeline acquires listings per source (API tier, then browser tier on
//! failure or empty result), runs the filter cascade, scores the surviving
//! pool, keeps the top `limit`, optionally drops off-target items through the
//! relevance filter, and assembles the ranked response.

pub mod cascade;
pub mod error;
pub mod pipeline;
pub mod relevance;
pub mod scorer;

pub use cascade::{apply_filters, CascadeOutcome};
pub use error::{RelevanceError, SearchError};
pub use pipeline::SearchPipeline;
pub use relevance::{Anthropic, Llm, RelevanceFilter};
pub use scorer::{score, PoolStats, ScoredListing};
