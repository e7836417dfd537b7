//! Ordered filter cascade with relaxation.
//!
//! Stages run in order: price ceiling, delivery confidence, free shipping,
//! official store, rating floor. The delivery and rating stages relax when
//! they would leave too few listings. A listing with no rating is never
//! excluded by the rating stage.

use pricescout_core::{estimate_delivery, RawListing, SearchOptions, SellerTier};

/// Fallback floor when too few listings clear the requested one.
pub const RELAXED_MIN_RATING: f64 = 3.5;

/// Below this many survivors the rating floor is relaxed.
pub const MIN_POOL_BEFORE_RELAXING: usize = 3;

/// Uncertain-delivery listings are dropped only when at least this many
/// confident ones remain.
pub const MIN_CONFIDENT_DELIVERY: usize = 3;

#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub pool: Vec<RawListing>,
    /// Floor actually applied; `None` when the rating stage was skipped.
    pub effective_min_rating: Option<f64>,
}

/// Runs every stage of the cascade over `listings`, preserving order.
#[must_use]
pub fn apply_filters(listings: Vec<RawListing>, options: &SearchOptions) -> CascadeOutcome {
    let priced: Vec<RawListing> = listings
        .into_iter()
        .filter(|l| options.max_price.is_none_or(|max| l.price() <= max))
        .collect();

    let pool: Vec<RawListing> = prefer_confident_delivery(priced)
        .into_iter()
        .filter(|l| !options.free_shipping_only || l.free_shipping())
        .filter(|l| !options.official_store_only || l.seller_tier() == SellerTier::OfficialStore)
        .collect();

    let strict = rated_at_least(&pool, options.min_rating);
    if strict.len() >= MIN_POOL_BEFORE_RELAXING {
        return CascadeOutcome {
            pool: strict,
            effective_min_rating: Some(options.min_rating),
        };
    }

    // Relaxing never raises a floor the caller already set lower.
    let relaxed_floor = RELAXED_MIN_RATING.min(options.min_rating);
    let relaxed = if relaxed_floor < options.min_rating {
        rated_at_least(&pool, relaxed_floor)
    } else {
        strict
    };
    if !relaxed.is_empty() {
        tracing::debug!(
            requested = options.min_rating,
            applied = relaxed_floor,
            survivors = relaxed.len(),
            "rating floor relaxed"
        );
        return CascadeOutcome {
            pool: relaxed,
            effective_min_rating: Some(relaxed_floor),
        };
    }

    if !pool.is_empty() {
        tracing::debug!(
            requested = options.min_rating,
            pool = pool.len(),
            "no listing clears any rating floor; rating stage skipped"
        );
    }
    CascadeOutcome {
        pool,
        effective_min_rating: None,
    }
}

/// Drops listings whose delivery estimate is uncertain, unless that would
/// leave fewer than [`MIN_CONFIDENT_DELIVERY`] listings.
fn prefer_confident_delivery(pool: Vec<RawListing>) -> Vec<RawListing> {
    let confident = |l: &RawListing| estimate_delivery(l.logistics(), l.seller_tier()).confident;
    let confident_count = pool.iter().filter(|l| confident(l)).count();
    if confident_count < MIN_CONFIDENT_DELIVERY {
        return pool;
    }

    let before = pool.len();
    let kept: Vec<RawListing> = pool.into_iter().filter(|l| confident(l)).collect();
    if kept.len() < before {
        tracing::debug!(
            dropped = before - kept.len(),
            kept = kept.len(),
            "dropped listings with uncertain delivery"
        );
    }
    kept
}

fn rated_at_least(pool: &[RawListing], floor: f64) -> Vec<RawListing> {
    pool.iter()
        .filter(|l| l.rating().is_none_or(|r| r >= floor))
        .cloned()
        .collect()
}
