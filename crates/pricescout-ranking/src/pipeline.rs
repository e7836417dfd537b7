//! Search orchestration.

use std::sync::Arc;

use futures::future::join_all;
use pricescout_core::{
    estimate_delivery, AppConfig, FiltersApplied, RankedListing, RawListing, SearchOptions,
    SearchResponse, Source, SourceWarning,
};
use pricescout_scraper::{SearchRequest, SourceRegistry};

use crate::cascade::apply_filters;
use crate::error::SearchError;
use crate::relevance::{Anthropic, RelevanceFilter};
use crate::scorer::{score, PoolStats, ScoredListing};

/// Listings and warnings gathered for one source.
#[derive(Debug, Default)]
struct Acquisition {
    listings: Vec<RawListing>,
    warnings: Vec<SourceWarning>,
}

/// Everything needed to answer queries: the adapters and the relevance filter.
pub struct SearchPipeline {
    registry: SourceRegistry,
    relevance: RelevanceFilter,
}

impl SearchPipeline {
    #[must_use]
    pub fn new(registry: SourceRegistry, relevance: RelevanceFilter) -> Self {
        Self {
            registry,
            relevance,
        }
    }

    /// Builds the production pipeline. The relevance filter is enabled only
    /// when an Anthropic key is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Setup`] or [`SearchError::RelevanceSetup`] if an
    /// HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, SearchError> {
        let registry = SourceRegistry::from_config(config)?;
        let relevance = match &config.anthropic_api_key {
            Some(key) => RelevanceFilter::new(Arc::new(Anthropic::new(
                key.clone(),
                config.relevance_model.clone(),
                config.relevance_timeout_secs,
            )?)),
            None => RelevanceFilter::disabled(),
        };
        Ok(Self::new(registry, relevance))
    }

    /// Runs one query end to end.
    ///
    /// 1. Acquire listings from every requested source concurrently, falling
    ///    back to the browser tier when the API tier fails or finds nothing.
    /// 2. Run the filter cascade over the merged pool.
    /// 3. Score, sort by score (stable), and keep the top `limit`.
    /// 4. Drop off-target items through the relevance filter.
    /// 5. Number the survivors and attach delivery estimates.
    ///
    /// Browser resources are released before this returns, on every path.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] for bad options and
    /// [`SearchError::AggregateFailure`] when no listing was obtained and at
    /// least one adapter failed.
    pub async fn run(&self, options: SearchOptions) -> Result<SearchResponse, SearchError> {
        let options = options.validate()?;
        let sources = options.sources.sources();
        let request = SearchRequest {
            query: &options.query,
            limit: options.limit,
            max_price: options.max_price,
        };

        let acquisitions = join_all(sources.iter().map(|&s| self.acquire(s, &request))).await;
        self.registry.release().await;

        let mut raw = Vec::new();
        let mut warnings = Vec::new();
        for acquisition in acquisitions {
            raw.extend(acquisition.listings);
            warnings.extend(acquisition.warnings);
        }

        if raw.is_empty() && !warnings.is_empty() {
            return Err(SearchError::AggregateFailure { warnings });
        }
        tracing::info!(
            query = %options.query,
            listings = raw.len(),
            warnings = warnings.len(),
            "acquisition complete"
        );

        let outcome = apply_filters(raw, &options);
        let mut scored: Vec<ScoredListing> = match PoolStats::from_pool(&outcome.pool) {
            Some(stats) => outcome
                .pool
                .into_iter()
                .map(|listing| {
                    let score = score(&listing, &stats);
                    ScoredListing { listing, score }
                })
                .collect(),
            None => Vec::new(),
        };
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(options.limit);

        let verdict = self.relevance.apply(&options.query, scored).await;
        warnings.extend(verdict.warning);

        let results: Vec<RankedListing> = verdict
            .kept
            .into_iter()
            .zip(1u32..)
            .map(|(scored, rank)| {
                let estimate =
                    estimate_delivery(scored.listing.logistics(), scored.listing.seller_tier());
                RankedListing {
                    rank,
                    listing: scored.listing,
                    estimated_delivery: estimate.label,
                    estimated_delivery_ok: estimate.confident,
                    score: scored.score,
                }
            })
            .collect();

        let mut result_sources: Vec<Source> = Vec::new();
        for r in &results {
            if !result_sources.contains(&r.listing.source()) {
                result_sources.push(r.listing.source());
            }
        }

        Ok(SearchResponse {
            query: options.query.clone(),
            total: results.len(),
            sources: result_sources,
            filters_applied: FiltersApplied {
                max_price: options.max_price,
                min_rating: options.min_rating,
                effective_min_rating: outcome.effective_min_rating,
                free_shipping: options.free_shipping_only,
                official_store: options.official_store_only,
            },
            results,
            warnings,
        })
    }

    /// Tries each tier of `source` in order until one returns listings.
    ///
    /// Failures become `{source}-{tier}` warnings; an empty success moves on
    /// to the next tier without a warning.
    async fn acquire(&self, source: Source, request: &SearchRequest<'_>) -> Acquisition {
        let mut acquisition = Acquisition::default();
        for adapter in self.registry.tiers_for(source) {
            let tier = adapter.tier();
            match adapter.search(request).await {
                Ok(listings) if !listings.is_empty() => {
                    tracing::debug!(
                        source = %source,
                        tier = %tier,
                        count = listings.len(),
                        "listings acquired"
                    );
                    acquisition.listings = listings;
                    return acquisition;
                }
                Ok(_) => {
                    tracing::debug!(source = %source, tier = %tier, "tier returned no listings");
                }
                Err(e) => {
                    tracing::warn!(source = %source, tier = %tier, error = %e, "tier failed");
                    acquisition
                        .warnings
                        .push(SourceWarning::new(format!("{source}-{tier}"), e.to_string()));
                }
            }
        }
        acquisition
    }
}
