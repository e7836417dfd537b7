//! Validated search options.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::listing::Source;

/// Default number of results returned when the caller does not ask.
pub const DEFAULT_LIMIT: usize = 10;

/// Hard cap on results per query; larger requests are clamped.
pub const MAX_LIMIT: usize = 30;

/// Rating floor applied when the caller does not ask for one.
pub const DEFAULT_MIN_RATING: f64 = 4.0;

/// Invalid caller input. Surfaces before any network work is done.
#[derive(Debug, Error, PartialEq)]
pub enum ArgumentError {
    #[error("--query is required and must not be blank")]
    EmptyQuery,

    #[error("--source must be ml, amazon or both (got \"{0}\")")]
    InvalidSource(String),

    #[error("--max-price must be a positive number (got {0})")]
    InvalidMaxPrice(Decimal),

    #[error("--min-rating must be between 0 and 5 (got {0})")]
    InvalidMinRating(f64),

    #[error("--limit must be at least 1")]
    ZeroLimit,
}

/// Which sources a query should hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceSelection {
    Ml,
    Amazon,
    #[default]
    Both,
}

impl SourceSelection {
    /// Requested sources in merge order.
    #[must_use]
    pub fn sources(self) -> Vec<Source> {
        match self {
            SourceSelection::Ml => vec![Source::Ml],
            SourceSelection::Amazon => vec![Source::Amazon],
            SourceSelection::Both => vec![Source::Ml, Source::Amazon],
        }
    }
}

impl FromStr for SourceSelection {
    type Err = ArgumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ml" => Ok(SourceSelection::Ml),
            "amazon" => Ok(SourceSelection::Amazon),
            "both" => Ok(SourceSelection::Both),
            _ => Err(ArgumentError::InvalidSource(s.to_owned())),
        }
    }
}

/// Everything a single query needs, after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub query: String,
    pub sources: SourceSelection,
    pub max_price: Option<Decimal>,
    pub min_rating: f64,
    pub free_shipping_only: bool,
    pub official_store_only: bool,
    pub limit: usize,
}

impl SearchOptions {
    /// Options for `query` with every other field at its default.
    #[must_use]
    pub fn for_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            sources: SourceSelection::default(),
            max_price: None,
            min_rating: DEFAULT_MIN_RATING,
            free_shipping_only: false,
            official_store_only: false,
            limit: DEFAULT_LIMIT,
        }
    }

    /// Checks caller input, trims the query, and clamps `limit` to
    /// [`MAX_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ArgumentError`] found.
    pub fn validate(mut self) -> Result<Self, ArgumentError> {
        self.query = self.query.trim().to_owned();
        if self.query.is_empty() {
            return Err(ArgumentError::EmptyQuery);
        }
        if let Some(max_price) = self.max_price {
            if max_price <= Decimal::ZERO {
                return Err(ArgumentError::InvalidMaxPrice(max_price));
            }
        }
        if !self.min_rating.is_finite() || !(0.0..=5.0).contains(&self.min_rating) {
            return Err(ArgumentError::InvalidMinRating(self.min_rating));
        }
        if self.limit == 0 {
            return Err(ArgumentError::ZeroLimit);
        }
        self.limit = self.limit.min(MAX_LIMIT);
        Ok(self)
    }
}
