use std::sync::Arc;

use async_trait::async_trait;
use pricescout_core::{Condition, LogisticsTier, RawListing, SellerTier, Source};
use reqwest::Url;

use super::recipe::PageRecipe;
use super::{BrowserPage, BrowserTimeouts, LazyBrowser};
use crate::adapters::{ListingAdapter, SearchRequest, Tier};
use crate::error::ScraperError;
use crate::normalize::{
    is_free_shipping_label, looks_refurbished, parse_price, parse_rating, parse_review_count,
};
use crate::types::ScrapedItem;

/// Browser-tier adapter for any source with a [`PageRecipe`].
pub struct BrowserAdapter {
    recipe: PageRecipe,
    browser: Arc<LazyBrowser>,
    timeouts: BrowserTimeouts,
}

impl BrowserAdapter {
    #[must_use]
    pub fn new(recipe: PageRecipe, browser: Arc<LazyBrowser>, timeouts: BrowserTimeouts) -> Self {
        Self {
            recipe,
            browser,
            timeouts,
        }
    }

    async fn scrape(
        &self,
        page: &mut dyn BrowserPage,
        url: &Url,
        request: &SearchRequest<'_>,
    ) -> Result<Vec<RawListing>, ScraperError> {
        page.navigate(url.as_str(), self.timeouts.navigation).await?;

        let item_selector = self.recipe.selectors.item;
        if !page.wait_for(item_selector, self.timeouts.element_wait).await? {
            let html = page.content().await?;
            if let Some(indicator) = self.recipe.block_indicator(&html) {
                return Err(ScraperError::Blocked {
                    url: url.to_string(),
                    indicator: indicator.to_owned(),
                });
            }
            if self.recipe.is_empty_result(&html) {
                tracing::debug!(
                    source = %self.recipe.source,
                    tier = "browser",
                    "search page reports no results"
                );
                return Ok(Vec::new());
            }
            return Err(ScraperError::PageStructure {
                url: url.to_string(),
                selector: item_selector.to_owned(),
            });
        }

        let value = page.evaluate(&self.recipe.extraction_script()).await?;
        let items: Vec<ScrapedItem> =
            serde_json::from_value(value).map_err(|e| ScraperError::Deserialize {
                context: format!("{} browser extraction", self.recipe.source),
                source: e,
            })?;

        let total = items.len();
        let listings: Vec<RawListing> = items
            .into_iter()
            .filter_map(|item| {
                let listing = listing_from_scraped(&self.recipe, item);
                if listing.is_none() {
                    tracing::debug!(
                        source = %self.recipe.source,
                        tier = "browser",
                        "dropping item without parsable title or price"
                    );
                }
                listing
            })
            .filter(|l| request.max_price.is_none_or(|max| l.price() <= max))
            .take(request.limit)
            .collect();

        tracing::debug!(
            source = %self.recipe.source,
            tier = "browser",
            total,
            kept = listings.len(),
            "browser scrape complete"
        );
        Ok(listings)
    }
}

#[async_trait]
impl ListingAdapter for BrowserAdapter {
    fn source(&self) -> Source {
        self.recipe.source
    }

    fn tier(&self) -> Tier {
        Tier::Browser
    }

    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawListing>, ScraperError> {
        let url = self.recipe.search_url(request.query)?;
        let engine = self.browser.engine().await?;
        let mut page = engine.open_page().await?;

        let result = self.scrape(page.as_mut(), &url, request).await;
        page.close().await;
        result
    }
}

pub(crate) fn listing_from_scraped(recipe: &PageRecipe, item: ScrapedItem) -> Option<RawListing> {
    let title = item.title?;
    let price = parse_price(item.price_text.as_deref()?)?;
    let url = item.url.unwrap_or_default();
    let shipping = item.shipping_text.unwrap_or_default();

    let fulfilled = item.fulfilled
        || shipping
            .split_whitespace()
            .any(|word| word.eq_ignore_ascii_case("full"));
    let free_shipping =
        (fulfilled && recipe.fulfillment_ships_free) || is_free_shipping_label(&shipping);
    let logistics = if fulfilled {
        LogisticsTier::Fulfillment
    } else {
        LogisticsTier::Unknown
    };

    let seller = item
        .seller_text
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(
            || {
                if fulfilled {
                    recipe.fulfilled_seller.to_owned()
                } else {
                    recipe.fallback_seller.to_owned()
                }
            },
            str::to_owned,
        );
    let condition = if looks_refurbished(&url, &title) {
        Condition::Used
    } else {
        Condition::New
    };

    let listing = RawListing::new(recipe.source, title, price)
        .ok()?
        .with_rating(item.rating_text.as_deref().and_then(parse_rating))
        .with_review_count(item.reviews_text.as_deref().and_then(parse_review_count))
        .with_free_shipping(free_shipping)
        .with_seller(seller, SellerTier::Regular)
        .with_permalink(url)
        .with_condition(condition)
        .with_logistics(logistics);
    Some(listing)
}

#[cfg(test)]
#[path = "adapter_test.rs"]
mod tests;
