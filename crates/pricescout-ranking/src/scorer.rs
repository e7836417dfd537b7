//! Weighted utility score for a listing relative to its pool.
//!
//! Weights: price 35%, rating 25%, review volume 15%, free shipping 15%,
//! seller reputation 10%. Price and review volume are relative to the pool
//! the listing is scored in, so scores are only comparable within one query.

use pricescout_core::{RawListing, SellerTier};

const PRICE_WEIGHT: f64 = 0.35;
const RATING_WEIGHT: f64 = 0.25;
const REVIEWS_WEIGHT: f64 = 0.15;
const SHIPPING_WEIGHT: f64 = 0.15;
const SELLER_WEIGHT: f64 = 0.10;

/// Shipping component for listings without free shipping.
const PAID_SHIPPING_SCORE: f64 = 0.3;

/// A listing with its score, before a rank is assigned.
#[derive(Debug, Clone)]
pub struct ScoredListing {
    pub listing: RawListing,
    pub score: f64,
}

/// Pool-wide extremes the relative components are computed against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolStats {
    pub min_price: f64,
    pub max_price: f64,
    pub max_reviews: u64,
}

impl PoolStats {
    /// `None` for an empty pool.
    #[must_use]
    pub fn from_pool(pool: &[RawListing]) -> Option<Self> {
        let first = pool.first()?;
        let init = Self {
            min_price: first.price_f64(),
            max_price: first.price_f64(),
            max_reviews: first.review_count().unwrap_or(0),
        };
        Some(pool.iter().fold(init, |acc, l| Self {
            min_price: acc.min_price.min(l.price_f64()),
            max_price: acc.max_price.max(l.price_f64()),
            max_reviews: acc.max_reviews.max(l.review_count().unwrap_or(0)),
        }))
    }
}

#[must_use]
pub fn seller_score(tier: SellerTier) -> f64 {
    match tier {
        SellerTier::OfficialStore => 1.0,
        SellerTier::Platinum => 0.9,
        SellerTier::Gold => 0.8,
        SellerTier::Silver => 0.6,
        SellerTier::Regular => 0.4,
    }
}

/// Scores `listing` in `[0, 100]`, rounded to one decimal.
///
/// An unknown rating counts as zero here even though the cascade lets it
/// through.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(listing: &RawListing, stats: &PoolStats) -> f64 {
    let price_range = stats.max_price - stats.min_price;
    let price_score = if price_range > 0.0 {
        1.0 - (listing.price_f64() - stats.min_price) / price_range
    } else {
        1.0
    };

    let rating_score = listing.rating().unwrap_or(0.0) / 5.0;

    let reviews = listing.review_count().unwrap_or(0) as f64;
    let reviews_score = if stats.max_reviews > 0 {
        (reviews + 1.0).log10() / (stats.max_reviews as f64 + 1.0).log10()
    } else {
        0.0
    };

    let shipping_score = if listing.free_shipping() {
        1.0
    } else {
        PAID_SHIPPING_SCORE
    };

    let total = PRICE_WEIGHT * price_score
        + RATING_WEIGHT * rating_score
        + REVIEWS_WEIGHT * reviews_score
        + SHIPPING_WEIGHT * shipping_score
        + SELLER_WEIGHT * seller_score(listing.seller_tier());

    ((total * 1000.0).round() / 10.0).clamp(0.0, 100.0)
}
