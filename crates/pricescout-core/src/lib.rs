//! Shared domain types for the pricescout workspace.
//!
//! Listings, the delivery estimator, validated search options, the response
//! document, and environment-driven configuration live here so the scraper,
//! ranking, and CLI crates agree on one vocabulary.

pub mod app_config;
pub mod config;
pub mod delivery;
pub mod listing;
pub mod response;
pub mod search;

use thiserror::Error;

pub use app_config::{AppConfig, MlOAuthConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use delivery::{estimate_delivery, DeliveryEstimate};
pub use listing::{Condition, InvalidListing, LogisticsTier, RawListing, SellerTier, Source};
pub use response::{FiltersApplied, RankedListing, SearchResponse, SourceWarning};
pub use search::{ArgumentError, SearchOptions, SourceSelection};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
