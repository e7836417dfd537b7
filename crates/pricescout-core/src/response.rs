//! The structured document returned to the automation caller.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::listing::{RawListing, Source};

/// A non-fatal problem recorded while serving a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceWarning {
    /// Origin label, e.g. `ml-api`, `amazon-browser`, `relevance`.
    pub source: String,
    pub error: String,
}

impl SourceWarning {
    pub fn new(source: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            error: error.into(),
        }
    }
}

/// Echo of the filters a query ran with.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FiltersApplied {
    #[serde(with = "rust_decimal::serde::float_option")]
    pub max_price: Option<Decimal>,
    pub min_rating: f64,
    /// Floor the cascade actually used after relaxation; `None` when the
    /// rating stage was skipped entirely.
    pub effective_min_rating: Option<f64>,
    pub free_shipping: bool,
    pub official_store: bool,
}

/// A listing in its final, ranked position.
#[derive(Debug, Clone, Serialize)]
pub struct RankedListing {
    /// 1-based position in the returned array.
    pub rank: u32,
    #[serde(flatten)]
    pub listing: RawListing,
    pub estimated_delivery: &'static str,
    pub estimated_delivery_ok: bool,
    /// Weighted utility in `[0, 100]`, one decimal.
    pub score: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub total: usize,
    pub sources: Vec<Source>,
    pub filters_applied: FiltersApplied,
    pub results: Vec<RankedListing>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<SourceWarning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> FiltersApplied {
        FiltersApplied {
            max_price: Some("200".parse().unwrap()),
            min_rating: 4.0,
            effective_min_rating: Some(3.5),
            free_shipping: true,
            official_store: false,
        }
    }

    #[test]
    fn warnings_are_omitted_when_empty() {
        let response = SearchResponse {
            query: "liquidificador".to_owned(),
            total: 0,
            sources: vec![],
            filters_applied: filters(),
            results: vec![],
            warnings: vec![],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("warnings").is_none());
        assert_eq!(json["total"], 0);
        assert_eq!(json["filters_applied"]["max_price"], 200.0);
        assert_eq!(json["filters_applied"]["effective_min_rating"], 3.5);
    }

    #[test]
    fn ranked_listing_flattens_listing_fields() {
        let listing = RawListing::new(Source::Amazon, "Fone JBL", "199.90".parse().unwrap())
            .unwrap()
            .with_free_shipping(true);
        let ranked = RankedListing {
            rank: 1,
            listing,
            estimated_delivery: "≤3 dias",
            estimated_delivery_ok: true,
            score: 87.5,
        };
        let json = serde_json::to_value(&ranked).unwrap();
        assert_eq!(json["rank"], 1);
        assert_eq!(json["title"], "Fone JBL");
        assert_eq!(json["source"], "amazon");
        assert_eq!(json["free_shipping"], true);
        assert_eq!(json["estimated_delivery"], "≤3 dias");
        assert_eq!(json["score"], 87.5);
    }

    #[test]
    fn warnings_serialize_as_source_error_pairs() {
        let warning = SourceWarning::new("ml-api", "HTTP 503");
        let json = serde_json::to_value(&warning).unwrap();
        assert_eq!(json, serde_json::json!({"source": "ml-api", "error": "HTTP 503"}));
    }
}
