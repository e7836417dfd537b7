//! `search` command handler.

use clap::Args;
use pricescout_core::search::{DEFAULT_LIMIT, DEFAULT_MIN_RATING};
use pricescout_core::{AppConfig, ArgumentError, SearchOptions, SourceSelection};
use pricescout_ranking::{SearchError, SearchPipeline};
use rust_decimal::Decimal;

use crate::{EXIT_ACQUISITION_FAILED, EXIT_INVALID_INPUT};

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Free-text product query
    #[arg(long)]
    pub query: String,

    /// Sources to search: ml, amazon or both
    #[arg(long, default_value = "both")]
    pub source: SourceSelection,

    /// Drop listings priced above this many BRL
    #[arg(long)]
    pub max_price: Option<Decimal>,

    /// Minimum star rating (relaxed to 3.5 when too few listings qualify)
    #[arg(long, default_value_t = DEFAULT_MIN_RATING)]
    pub min_rating: f64,

    /// Keep only listings with free shipping
    #[arg(long)]
    pub free_shipping: bool,

    /// Keep only listings sold by official brand stores
    #[arg(long)]
    pub official_store: bool,

    /// Maximum number of results (values above 30 are clamped)
    #[arg(long, default_value_t = DEFAULT_LIMIT)]
    pub limit: usize,
}

impl SearchArgs {
    pub fn into_options(self) -> SearchOptions {
        SearchOptions {
            query: self.query,
            sources: self.source,
            max_price: self.max_price,
            min_rating: self.min_rating,
            free_shipping_only: self.free_shipping,
            official_store_only: self.official_store,
            limit: self.limit,
        }
    }
}

/// Runs one search and returns the pretty-printed response document.
///
/// Options are validated before any adapter is built.
///
/// # Errors
///
/// Returns the validation error, a setup failure, or
/// [`SearchError::AggregateFailure`] when every source failed.
pub async fn run_search(args: SearchArgs, config: &AppConfig) -> anyhow::Result<String> {
    let options = args.into_options().validate()?;
    tracing::debug!(?options, "search options validated");

    let pipeline = SearchPipeline::from_config(config)?;
    let response = pipeline.run(options).await?;
    tracing::info!(
        total = response.total,
        warnings = response.warnings.len(),
        "search complete"
    );
    Ok(serde_json::to_string_pretty(&response)?)
}

/// Maps a failed run to the process exit code.
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    if err.is::<ArgumentError>() {
        return EXIT_INVALID_INPUT;
    }
    match err.downcast_ref::<SearchError>() {
        Some(SearchError::InvalidArgument(_)) => EXIT_INVALID_INPUT,
        _ => EXIT_ACQUISITION_FAILED,
    }
}
