//! Source-native response shapes for the structured-API tier.
//!
//! ## Mercado Livre via RapidAPI (`mercado-libre7`)
//! `GET /listings_for_search` returns `{ search_results, page_results, data }`.
//! Every field inside `data[]` is a display **string**: `price` is `"1.299,90"`
//! or `"249.90"` depending on listing, `rating` is `"4.8"`, `votes` is
//! `"(1.234)"` or `"(2,3 mil)"`, and `shipping` is free text such as
//! `"Frete grátis"` or `"Chegará grátis amanhã FULL"`. `seller` is often blank.
//! No logistics or reputation data is exposed, so these listings map to the
//! regular tier with unknown logistics unless the shipping text says `FULL`.
//!
//! ## Mercado Livre official API (`sites/MLB/search`)
//! Returns `{ results: [...] }` with a numeric `price`, `condition` of
//! `"new"`/`"used"`, and nested `shipping`, `seller`, `reviews` objects.
//! `seller.power_seller_status` is frequently `null` at the top level and only
//! present under `seller.reputation`. `reviews` is absent for most listings.
//! `official_store_id` is `null` (not omitted) for non-official sellers.
//!
//! ## Amazon via RapidAPI (`real-time-amazon-data`)
//! `GET /search` returns `{ status, request_id, data: { products: [...] } }`.
//! `product_price` is a display string (`"R$ 199,90"`) and may be `null` for
//! unavailable items. `product_star_rating` is a string (`"4.6"`) or `null`;
//! `product_num_ratings` is an integer, `0` when unrated.

use serde::Deserialize;

/// Envelope for `GET /listings_for_search`.
#[derive(Debug, Deserialize)]
pub struct MlRapidSearchResponse {
    #[serde(default)]
    pub data: Vec<MlRapidItem>,
}

/// One listing from the RapidAPI Mercado Livre endpoint.
#[derive(Debug, Deserialize)]
pub struct MlRapidItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub votes: Option<String>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default)]
    pub shipping: Option<String>,
}

/// Envelope for the official `sites/MLB/search` endpoint.
#[derive(Debug, Deserialize)]
pub struct MlOfficialSearchResponse {
    #[serde(default)]
    pub results: Vec<MlOfficialItem>,
}

#[derive(Debug, Deserialize)]
pub struct MlOfficialItem {
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub price: Option<f64>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default)]
    pub shipping: Option<MlShipping>,
    #[serde(default)]
    pub seller: Option<MlSeller>,
    #[serde(default)]
    pub reviews: Option<MlReviews>,
    #[serde(default)]
    pub official_store_id: Option<i64>,
    #[serde(default)]
    pub official_store_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MlShipping {
    #[serde(default)]
    pub free_shipping: bool,
    #[serde(default)]
    pub logistic_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MlSeller {
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub power_seller_status: Option<String>,
    #[serde(default)]
    pub reputation: Option<MlReputation>,
}

impl MlSeller {
    /// Top-level status first, then the one nested under `reputation`.
    #[must_use]
    pub fn power_seller_status(&self) -> Option<&str> {
        self.power_seller_status.as_deref().or_else(|| {
            self.reputation
                .as_ref()
                .and_then(|r| r.power_seller_status.as_deref())
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct MlReputation {
    #[serde(default)]
    pub power_seller_status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MlReviews {
    #[serde(default)]
    pub rating_average: Option<f64>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Envelope for the Amazon `GET /search` endpoint.
#[derive(Debug, Deserialize)]
pub struct AmazonSearchResponse {
    #[serde(default)]
    pub data: Option<AmazonSearchData>,
}

#[derive(Debug, Deserialize)]
pub struct AmazonSearchData {
    #[serde(default)]
    pub products: Vec<AmazonApiProduct>,
}

#[derive(Debug, Deserialize)]
pub struct AmazonApiProduct {
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub product_price: Option<String>,
    #[serde(default)]
    pub product_star_rating: Option<String>,
    #[serde(default)]
    pub product_num_ratings: Option<u64>,
    #[serde(default)]
    pub product_url: Option<String>,
    #[serde(default)]
    pub delivery: Option<String>,
    #[serde(default)]
    pub is_prime: bool,
}

/// One offer as extracted from a consumer search page by the browser tier.
///
/// Produced by the per-source extraction script; every field is raw page text.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapedItem {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub price_text: Option<String>,
    #[serde(default)]
    pub rating_text: Option<String>,
    #[serde(default)]
    pub reviews_text: Option<String>,
    #[serde(default)]
    pub shipping_text: Option<String>,
    #[serde(default)]
    pub seller_text: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Platform fulfillment badge (ML `FULL`, Amazon Prime) was present.
    #[serde(default)]
    pub fulfilled: bool,
}
