//! The raw listing model shared by every source adapter.
//!
//! A [`RawListing`] can only be built through [`RawListing::new`], which
//! rejects blank titles and non-positive prices. Adapters that cannot parse a
//! price simply skip the offer; there is no placeholder listing.

use std::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

/// E-commerce source a listing was discovered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Mercado Livre (Brazil).
    Ml,
    /// Amazon Brazil.
    Amazon,
}

impl Source {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Ml => "ml",
            Source::Amazon => "amazon",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reputation classification of the merchant behind a listing.
///
/// Variants are ordered from most to least trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SellerTier {
    #[serde(rename = "official_store")]
    OfficialStore,
    #[serde(rename = "mercadolider_platinum")]
    Platinum,
    #[serde(rename = "mercadolider_gold")]
    Gold,
    #[serde(rename = "mercadolider_silver")]
    Silver,
    #[serde(rename = "regular")]
    Regular,
}

impl SellerTier {
    /// Maps a Mercado Livre `power_seller_status` value to a tier.
    ///
    /// Unknown or absent statuses map to [`SellerTier::Regular`].
    #[must_use]
    pub fn from_power_seller_status(status: Option<&str>) -> Self {
        match status.map(str::to_ascii_lowercase).as_deref() {
            Some("platinum") => SellerTier::Platinum,
            Some("gold") => SellerTier::Gold,
            Some("silver") => SellerTier::Silver,
            _ => SellerTier::Regular,
        }
    }

    /// `true` for the two highest reputation tiers and official stores.
    #[must_use]
    pub fn is_high_reputation(self) -> bool {
        matches!(
            self,
            SellerTier::OfficialStore | SellerTier::Platinum | SellerTier::Gold
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    New,
    Used,
}

/// How the platform moves the item to the buyer.
///
/// Drives the delivery estimate. `Unknown` is a real signal, not a default:
/// the estimator reports low confidence for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogisticsTier {
    /// Stored and shipped by the platform itself (ML Full, Amazon Prime).
    Fulfillment,
    DropOff,
    CrossDocking,
    Unknown,
}

impl LogisticsTier {
    /// Maps a Mercado Livre `shipping.logistic_type` value.
    #[must_use]
    pub fn from_logistic_type(logistic_type: Option<&str>) -> Self {
        match logistic_type {
            Some("fulfillment") => LogisticsTier::Fulfillment,
            Some("xd_drop_off" | "drop_off") => LogisticsTier::DropOff,
            Some("cross_docking") => LogisticsTier::CrossDocking,
            _ => LogisticsTier::Unknown,
        }
    }
}

/// Reasons a listing cannot be constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidListing {
    #[error("listing title is empty")]
    EmptyTitle,

    #[error("listing price must be positive, got {0}")]
    NonPositivePrice(Decimal),
}

/// One offer from one source.
#[derive(Debug, Clone, Serialize)]
pub struct RawListing {
    source: Source,
    title: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    currency: &'static str,
    condition: Condition,
    rating: Option<f64>,
    #[serde(rename = "reviews_total")]
    review_count: Option<u64>,
    free_shipping: bool,
    #[serde(rename = "seller_type")]
    seller_tier: SellerTier,
    seller_name: String,
    permalink: String,
    #[serde(skip)]
    logistics: LogisticsTier,
}

impl RawListing {
    /// Builds a listing with the required fields.
    ///
    /// Optional attributes start as unknown (`rating`, `review_count`), not
    /// free-shipping, regular seller, new condition, unknown logistics, and
    /// are set with the `with_*` methods.
    ///
    /// # Errors
    ///
    /// - [`InvalidListing::EmptyTitle`] if `title` is blank after trimming.
    /// - [`InvalidListing::NonPositivePrice`] if `price <= 0`.
    pub fn new(
        source: Source,
        title: impl Into<String>,
        price: Decimal,
    ) -> Result<Self, InvalidListing> {
        let title = title.into().trim().to_owned();
        if title.is_empty() {
            return Err(InvalidListing::EmptyTitle);
        }
        if price <= Decimal::ZERO {
            return Err(InvalidListing::NonPositivePrice(price));
        }

        Ok(Self {
            source,
            title,
            price,
            currency: "BRL",
            condition: Condition::New,
            rating: None,
            review_count: None,
            free_shipping: false,
            seller_tier: SellerTier::Regular,
            seller_name: String::new(),
            permalink: String::new(),
            logistics: LogisticsTier::Unknown,
        })
    }

    /// Sets the star rating. Values outside `[0, 5]` or non-finite values are
    /// treated as unknown.
    #[must_use]
    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.rating = rating.filter(|r| r.is_finite() && (0.0..=5.0).contains(r));
        self
    }

    #[must_use]
    pub fn with_review_count(mut self, review_count: Option<u64>) -> Self {
        self.review_count = review_count;
        self
    }

    #[must_use]
    pub fn with_free_shipping(mut self, free_shipping: bool) -> Self {
        self.free_shipping = free_shipping;
        self
    }

    #[must_use]
    pub fn with_seller(mut self, name: impl Into<String>, tier: SellerTier) -> Self {
        self.seller_name = name.into();
        self.seller_tier = tier;
        self
    }

    #[must_use]
    pub fn with_permalink(mut self, permalink: impl Into<String>) -> Self {
        self.permalink = permalink.into();
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = condition;
        self
    }

    #[must_use]
    pub fn with_logistics(mut self, logistics: LogisticsTier) -> Self {
        self.logistics = logistics;
        self
    }

    #[must_use]
    pub fn source(&self) -> Source {
        self.source
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Price as `f64` for scoring arithmetic.
    #[must_use]
    pub fn price_f64(&self) -> f64 {
        self.price.to_f64().unwrap_or(f64::MAX)
    }

    #[must_use]
    pub fn currency(&self) -> &'static str {
        self.currency
    }

    #[must_use]
    pub fn condition(&self) -> Condition {
        self.condition
    }

    #[must_use]
    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    #[must_use]
    pub fn review_count(&self) -> Option<u64> {
        self.review_count
    }

    #[must_use]
    pub fn free_shipping(&self) -> bool {
        self.free_shipping
    }

    #[must_use]
    pub fn seller_tier(&self) -> SellerTier {
        self.seller_tier
    }

    #[must_use]
    pub fn seller_name(&self) -> &str {
        &self.seller_name
    }

    #[must_use]
    pub fn permalink(&self) -> &str {
        &self.permalink
    }

    #[must_use]
    pub fn logistics(&self) -> LogisticsTier {
        self.logistics
    }
}
