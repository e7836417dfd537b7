//! Mercado Livre structured-API tier.
//!
//! One adapter, two backends: the official `sites/MLB/search` endpoint when an
//! OAuth token provider is available, the RapidAPI `mercado-libre7` mirror
//! otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use pricescout_core::{Condition, LogisticsTier, RawListing, SellerTier, Source};
use reqwest::{Client, Url};
use rust_decimal::Decimal;

use super::{HttpSettings, ListingAdapter, SearchRequest, Tier};
use crate::client::{build_http_client, endpoint, parse_base_url, send_json};
use crate::error::ScraperError;
use crate::normalize::{
    is_free_shipping_label, looks_refurbished, parse_price, parse_rating, parse_review_count,
    MAX_PLAUSIBLE_PRICE,
};
use crate::token::TokenProvider;
use crate::types::{MlOfficialItem, MlOfficialSearchResponse, MlRapidItem, MlRapidSearchResponse};

const RAPIDAPI_BASE_URL: &str = "https://mercado-libre7.p.rapidapi.com/";
const RAPIDAPI_HOST: &str = "mercado-libre7.p.rapidapi.com";
const OFFICIAL_BASE_URL: &str = "https://api.mercadolivre.com.br/";

const FALLBACK_SELLER: &str = "Vendedor ML";

enum Backend {
    RapidApi { key: Option<String> },
    Official { tokens: Arc<TokenProvider> },
}

pub struct MercadoLivreApi {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
    backend: Backend,
}

impl MercadoLivreApi {
    /// RapidAPI backend against the production host.
    ///
    /// A missing key is not a construction error: every search reports
    /// [`ScraperError::MissingCredentials`] instead.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn rapidapi(key: Option<String>, settings: &HttpSettings) -> Result<Self, ScraperError> {
        Self::rapidapi_with_base_url(key, settings, RAPIDAPI_BASE_URL)
    }

    /// RapidAPI backend against a custom base URL (for wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] or [`ScraperError::InvalidBaseUrl`].
    pub fn rapidapi_with_base_url(
        key: Option<String>,
        settings: &HttpSettings,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Self::build(Backend::RapidApi { key }, settings, base_url)
    }

    /// Official API backend authenticated through `tokens`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn official(
        tokens: Arc<TokenProvider>,
        settings: &HttpSettings,
    ) -> Result<Self, ScraperError> {
        Self::official_with_base_url(tokens, settings, OFFICIAL_BASE_URL)
    }

    /// Official API backend against a custom base URL (for wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] or [`ScraperError::InvalidBaseUrl`].
    pub fn official_with_base_url(
        tokens: Arc<TokenProvider>,
        settings: &HttpSettings,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Self::build(Backend::Official { tokens }, settings, base_url)
    }

    fn build(
        backend: Backend,
        settings: &HttpSettings,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_http_client(settings.timeout_secs, &settings.user_agent)?,
            base_url: parse_base_url(base_url)?,
            timeout_secs: settings.timeout_secs,
            backend,
        })
    }

    async fn search_rapidapi(
        &self,
        key: &str,
        request: &SearchRequest<'_>,
    ) -> Result<Vec<RawListing>, ScraperError> {
        let mut url = endpoint(&self.base_url, "listings_for_search")?;
        url.query_pairs_mut()
            .append_pair("search_str", request.query)
            .append_pair("country", "br")
            .append_pair("sort_by", "relevance")
            .append_pair("page_num", "1");

        let builder = self
            .client
            .get(url.clone())
            .header("X-RapidAPI-Key", key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST)
            .header(reqwest::header::ACCEPT, "application/json");

        let response: MlRapidSearchResponse = send_json(
            builder,
            &url,
            self.timeout_secs,
            "mercado-libre7 listings_for_search",
        )
        .await?;

        let total = response.data.len();
        let listings: Vec<RawListing> = response
            .data
            .into_iter()
            .filter_map(|item| {
                let id = item.id.clone();
                let listing = listing_from_rapid(item);
                if listing.is_none() {
                    tracing::debug!(
                        source = "ml",
                        tier = "api",
                        id = ?id,
                        "dropping listing without parsable title or price"
                    );
                }
                listing
            })
            // This endpoint has no server-side price filter.
            .filter(|l| request.max_price.is_none_or(|max| l.price() <= max))
            .take(request.limit)
            .collect();

        tracing::debug!(
            source = "ml",
            tier = "api",
            backend = "rapidapi",
            total,
            kept = listings.len(),
            "ML search complete"
        );
        Ok(listings)
    }

    async fn search_official(
        &self,
        tokens: &TokenProvider,
        request: &SearchRequest<'_>,
    ) -> Result<Vec<RawListing>, ScraperError> {
        let access_token = tokens.access_token().await?;

        let mut url = endpoint(&self.base_url, "sites/MLB/search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", request.query)
                .append_pair("sort", "price_asc")
                .append_pair("limit", &request.limit.to_string());
            if let Some(max) = request.max_price {
                pairs.append_pair("price", &format!("*-{max}"));
            }
        }

        let builder = self
            .client
            .get(url.clone())
            .bearer_auth(access_token)
            .header(reqwest::header::ACCEPT, "application/json");

        let response: MlOfficialSearchResponse =
            send_json(builder, &url, self.timeout_secs, "ML sites/MLB/search").await?;

        let total = response.results.len();
        let listings: Vec<RawListing> = response
            .results
            .into_iter()
            .filter_map(|item| {
                let id = item.id.clone();
                let listing = listing_from_official(item);
                if listing.is_none() {
                    tracing::debug!(
                        source = "ml",
                        tier = "api",
                        id = ?id,
                        "dropping listing without parsable title or price"
                    );
                }
                listing
            })
            .take(request.limit)
            .collect();

        tracing::debug!(
            source = "ml",
            tier = "api",
            backend = "official",
            total,
            kept = listings.len(),
            "ML search complete"
        );
        Ok(listings)
    }
}

#[async_trait]
impl ListingAdapter for MercadoLivreApi {
    fn source(&self) -> Source {
        Source::Ml
    }

    fn tier(&self) -> Tier {
        Tier::Api
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawListing>, ScraperError> {
        match &self.backend {
            Backend::RapidApi { key: Some(key) } => self.search_rapidapi(key, request).await,
            Backend::RapidApi { key: None } => Err(ScraperError::MissingCredentials {
                var: "RAPIDAPI_KEY",
                adapter: "ml-api",
            }),
            Backend::Official { tokens } => self.search_official(tokens, request).await,
        }
    }
}

/// Maps a RapidAPI item. The mirror exposes no reputation data, so every
/// seller is regular; a `FULL` badge in the shipping text marks fulfillment.
pub(crate) fn listing_from_rapid(item: MlRapidItem) -> Option<RawListing> {
    let title = item.title?;
    let price = parse_price(item.price.as_deref()?)?;
    let url = item.url.unwrap_or_default();
    let shipping = item.shipping.unwrap_or_default();

    let condition = if looks_refurbished(&url, &title) {
        Condition::Used
    } else {
        Condition::New
    };
    let logistics = if shipping
        .split_whitespace()
        .any(|word| word.eq_ignore_ascii_case("full"))
    {
        LogisticsTier::Fulfillment
    } else {
        LogisticsTier::Unknown
    };
    let seller = item
        .seller
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_SELLER)
        .to_owned();

    let listing = RawListing::new(Source::Ml, title, price)
        .ok()?
        .with_rating(item.rating.as_deref().and_then(parse_rating))
        .with_review_count(item.votes.as_deref().and_then(parse_review_count))
        .with_free_shipping(is_free_shipping_label(&shipping))
        .with_seller(seller, SellerTier::Regular)
        .with_permalink(url)
        .with_condition(condition)
        .with_logistics(logistics);
    Some(listing)
}

pub(crate) fn listing_from_official(item: MlOfficialItem) -> Option<RawListing> {
    let price = Decimal::try_from(item.price?).ok()?.round_dp(2);
    if price > MAX_PLAUSIBLE_PRICE {
        return None;
    }

    let permalink = item.permalink.unwrap_or_default();
    let condition = if item.condition.as_deref() == Some("used")
        || looks_refurbished(&permalink, &item.title)
    {
        Condition::Used
    } else {
        Condition::New
    };

    let seller_tier = if item.official_store_id.is_some() {
        SellerTier::OfficialStore
    } else {
        SellerTier::from_power_seller_status(
            item.seller.as_ref().and_then(|s| s.power_seller_status()),
        )
    };
    let seller_name = item
        .official_store_name
        .or_else(|| item.seller.as_ref().and_then(|s| s.nickname.clone()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_SELLER.to_owned());

    let (free_shipping, logistics) = item.shipping.as_ref().map_or(
        (false, LogisticsTier::Unknown),
        |s| {
            (
                s.free_shipping,
                LogisticsTier::from_logistic_type(s.logistic_type.as_deref()),
            )
        },
    );

    // ML reports `rating_average: 0` for unreviewed items; that is "unknown".
    let (rating, review_count) = item.reviews.as_ref().map_or((None, None), |r| {
        match r.total {
            Some(0) => (None, Some(0)),
            total => (r.rating_average, total),
        }
    });

    let listing = RawListing::new(Source::Ml, item.title, price)
        .ok()?
        .with_rating(rating)
        .with_review_count(review_count)
        .with_free_shipping(free_shipping)
        .with_seller(seller_name, seller_tier)
        .with_permalink(permalink)
        .with_condition(condition)
        .with_logistics(logistics);
    Some(listing)
}
