//! Amazon Brazil structured-API tier via RapidAPI `real-time-amazon-data`.

use async_trait::async_trait;
use pricescout_core::{Condition, LogisticsTier, RawListing, SellerTier, Source};
use reqwest::{Client, Url};

use super::{HttpSettings, ListingAdapter, SearchRequest, Tier};
use crate::client::{build_http_client, endpoint, parse_base_url, send_json};
use crate::error::ScraperError;
use crate::normalize::{is_free_shipping_label, looks_refurbished, parse_price, parse_rating};
use crate::types::{AmazonApiProduct, AmazonSearchResponse};

const DEFAULT_BASE_URL: &str = "https://real-time-amazon-data.p.rapidapi.com/";
const RAPIDAPI_HOST: &str = "real-time-amazon-data.p.rapidapi.com";

pub struct AmazonApi {
    client: Client,
    base_url: Url,
    timeout_secs: u64,
    api_key: Option<String>,
}

impl AmazonApi {
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if the HTTP client cannot be built.
    pub fn new(api_key: Option<String>, settings: &HttpSettings) -> Result<Self, ScraperError> {
        Self::with_base_url(api_key, settings, DEFAULT_BASE_URL)
    }

    /// Creates an adapter with a custom base URL (for wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] or [`ScraperError::InvalidBaseUrl`].
    pub fn with_base_url(
        api_key: Option<String>,
        settings: &HttpSettings,
        base_url: &str,
    ) -> Result<Self, ScraperError> {
        Ok(Self {
            client: build_http_client(settings.timeout_secs, &settings.user_agent)?,
            base_url: parse_base_url(base_url)?,
            timeout_secs: settings.timeout_secs,
            api_key,
        })
    }
}

#[async_trait]
impl ListingAdapter for AmazonApi {
    fn source(&self) -> Source {
        Source::Amazon
    }

    fn tier(&self) -> Tier {
        Tier::Api
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawListing>, ScraperError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ScraperError::MissingCredentials {
                var: "RAPIDAPI_KEY",
                adapter: "amazon-api",
            });
        };

        let mut url = endpoint(&self.base_url, "search")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("query", request.query)
                .append_pair("country", "BR")
                .append_pair("sort_by", "RELEVANCE")
                .append_pair("page", "1");
            if let Some(max) = request.max_price {
                pairs.append_pair("max_price", &max.to_string());
            }
        }

        let builder = self
            .client
            .get(url.clone())
            .header("X-RapidAPI-Key", api_key)
            .header("X-RapidAPI-Host", RAPIDAPI_HOST);

        let response: AmazonSearchResponse =
            send_json(builder, &url, self.timeout_secs, "real-time-amazon-data search").await?;

        let products = response.data.map(|d| d.products).unwrap_or_default();
        let total = products.len();
        let listings: Vec<RawListing> = products
            .into_iter()
            .filter_map(|product| {
                let listing = listing_from_product(product);
                if listing.is_none() {
                    tracing::debug!(
                        source = "amazon",
                        tier = "api",
                        "dropping product without parsable title or price"
                    );
                }
                listing
            })
            .take(request.limit)
            .collect();

        tracing::debug!(
            source = "amazon",
            tier = "api",
            total,
            kept = listings.len(),
            "Amazon search complete"
        );
        Ok(listings)
    }
}

/// Prime offers ship from Amazon's own warehouses; everything else is a
/// marketplace seller with unknown logistics.
pub(crate) fn listing_from_product(product: AmazonApiProduct) -> Option<RawListing> {
    let title = product.product_title?;
    let price = parse_price(product.product_price.as_deref()?)?;
    let url = product.product_url.unwrap_or_default();
    let delivery = product.delivery.unwrap_or_default();

    let free_shipping = product.is_prime || is_free_shipping_label(&delivery);
    let (seller_name, logistics) = if product.is_prime {
        ("Amazon.com.br", LogisticsTier::Fulfillment)
    } else {
        ("Vendedor Amazon", LogisticsTier::Unknown)
    };
    let condition = if looks_refurbished(&url, &title) {
        Condition::Used
    } else {
        Condition::New
    };

    let listing = RawListing::new(Source::Amazon, title, price)
        .ok()?
        .with_rating(product.product_star_rating.as_deref().and_then(parse_rating))
        .with_review_count(product.product_num_ratings.filter(|n| *n > 0))
        .with_free_shipping(free_shipping)
        .with_seller(seller_name, SellerTier::Regular)
        .with_permalink(url)
        .with_condition(condition)
        .with_logistics(logistics);
    Some(listing)
}
