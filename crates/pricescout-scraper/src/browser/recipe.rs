//! Per-source page recipes for the browser tier.
//!
//! A recipe is everything source-specific about scraping a consumer search
//! page: how to build the URL, which selectors locate each field, and which
//! page texts mean "blocked" or "genuinely no results". The browser adapter
//! itself is source-agnostic.

use pricescout_core::Source;
use reqwest::Url;

use crate::error::ScraperError;

/// How the search term is placed in the URL.
#[derive(Debug, Clone, Copy)]
pub enum SearchUrl {
    /// `{base}/{words-joined-by-dashes}`
    PathSlug { base: &'static str },
    /// `{base}?{param}={query}`
    QueryParam {
        base: &'static str,
        param: &'static str,
    },
}

/// CSS selectors, relative to one result item except `item`.
#[derive(Debug, Clone, Copy)]
pub struct Selectors {
    pub item: &'static str,
    pub title: &'static str,
    pub link: &'static str,
    pub price: &'static str,
    /// Separate cents element, joined to `price` with a comma when present.
    pub price_cents: Option<&'static str>,
    pub rating: &'static str,
    pub reviews: &'static str,
    pub shipping: &'static str,
    pub seller: Option<&'static str>,
    /// Element whose presence marks platform fulfillment.
    pub fulfillment: &'static str,
}

#[derive(Debug, Clone)]
pub struct PageRecipe {
    pub source: Source,
    pub search_url: SearchUrl,
    pub selectors: Selectors,
    /// Lowercase page texts that identify a CAPTCHA or bot wall.
    pub block_indicators: &'static [&'static str],
    /// Lowercase page texts that identify a real zero-result page.
    pub empty_markers: &'static [&'static str],
    /// Seller name for fulfilled offers with no seller element.
    pub fulfilled_seller: &'static str,
    pub fallback_seller: &'static str,
    /// Fulfilled offers always ship free on this source.
    pub fulfillment_ships_free: bool,
}

#[must_use]
pub fn mercado_livre() -> PageRecipe {
    PageRecipe {
        source: Source::Ml,
        search_url: SearchUrl::PathSlug {
            base: "https://lista.mercadolivre.com.br/",
        },
        selectors: Selectors {
            item: "li.ui-search-layout__item",
            title: ".poly-component__title, .ui-search-item__title",
            link: "a.poly-component__title, a.ui-search-link",
            price: ".poly-price__current .andes-money-amount__fraction",
            price_cents: Some(".poly-price__current .andes-money-amount__cents"),
            rating: ".poly-reviews__rating",
            reviews: ".poly-reviews__total",
            shipping: ".poly-component__shipping",
            seller: Some(".poly-component__seller"),
            fulfillment: "svg[aria-label='FULL'], .poly-component__shipped-from",
        },
        block_indicators: &[
            "captcha",
            "account-verification",
            "suspicious-traffic",
            "não é um robô",
        ],
        empty_markers: &["não há anúncios que coincidam", "ui-search-rescue"],
        fulfilled_seller: "Vendedor ML",
        fallback_seller: "Vendedor ML",
        fulfillment_ships_free: false,
    }
}

#[must_use]
pub fn amazon() -> PageRecipe {
    PageRecipe {
        source: Source::Amazon,
        search_url: SearchUrl::QueryParam {
            base: "https://www.amazon.com.br/s",
            param: "k",
        },
        selectors: Selectors {
            item: "div[data-component-type='s-search-result']",
            title: "h2 span",
            link: "h2 a, a.a-link-normal.s-no-outline",
            price: ".a-price:not(.a-text-price) .a-offscreen",
            price_cents: None,
            rating: ".a-icon-alt",
            reviews: "span.s-underline-text",
            shipping: "[data-cy='delivery-recipe']",
            seller: None,
            fulfillment: "i.a-icon-prime",
        },
        block_indicators: &[
            "captcha",
            "digite os caracteres",
            "type the characters",
            "not a robot",
            "/errors/validatecaptcha",
        ],
        empty_markers: &["nenhum resultado para", "no results for"],
        fulfilled_seller: "Amazon.com.br",
        fallback_seller: "Vendedor Amazon",
        fulfillment_ships_free: true,
    }
}

impl PageRecipe {
    /// Consumer search URL for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidBaseUrl`] if the recipe's base URL is
    /// malformed or cannot carry path segments.
    pub fn search_url(&self, query: &str) -> Result<Url, ScraperError> {
        match self.search_url {
            SearchUrl::PathSlug { base } => {
                let mut url = parse(base)?;
                let slug = query
                    .split_whitespace()
                    .map(str::to_lowercase)
                    .collect::<Vec<_>>()
                    .join("-");
                url.path_segments_mut()
                    .map_err(|()| ScraperError::InvalidBaseUrl {
                        base_url: base.to_owned(),
                        reason: "cannot be a base".to_owned(),
                    })?
                    .pop_if_empty()
                    .push(&slug);
                Ok(url)
            }
            SearchUrl::QueryParam { base, param } => {
                let mut url = parse(base)?;
                url.query_pairs_mut().append_pair(param, query);
                Ok(url)
            }
        }
    }

    /// First block indicator found in `html`, if any.
    #[must_use]
    pub fn block_indicator(&self, html: &str) -> Option<&'static str> {
        let lower = html.to_lowercase();
        self.block_indicators
            .iter()
            .copied()
            .find(|marker| lower.contains(marker))
    }

    #[must_use]
    pub fn is_empty_result(&self, html: &str) -> bool {
        let lower = html.to_lowercase();
        self.empty_markers.iter().any(|marker| lower.contains(marker))
    }

    /// JavaScript that returns an array of scraped items.
    ///
    /// Every selector is embedded as a JSON string literal, so quotes inside
    /// selectors need no escaping here.
    #[must_use]
    pub fn extraction_script(&self) -> String {
        let s = &self.selectors;
        let lit = |sel: &str| serde_json::Value::from(sel).to_string();
        let opt = |sel: Option<&str>| sel.map_or_else(|| "null".to_owned(), lit);

        format!(
            r"(() => {{
  const text = (root, sel) => {{
    if (!sel) return null;
    const el = root.querySelector(sel);
    return el ? el.textContent.trim() : null;
  }};
  return Array.from(document.querySelectorAll({item})).map((node) => {{
    const fraction = text(node, {price});
    const cents = text(node, {cents});
    const link = node.querySelector({link});
    return {{
      title: text(node, {title}),
      price_text: fraction && cents ? fraction + ',' + cents : fraction,
      rating_text: text(node, {rating}),
      reviews_text: text(node, {reviews}),
      shipping_text: text(node, {shipping}),
      seller_text: text(node, {seller}),
      url: link ? link.href : null,
      fulfilled: node.querySelector({fulfillment}) !== null,
    }};
  }});
}})()",
            item = lit(s.item),
            price = lit(s.price),
            cents = opt(s.price_cents),
            link = lit(s.link),
            title = lit(s.title),
            rating = lit(s.rating),
            reviews = lit(s.reviews),
            shipping = lit(s.shipping),
            seller = opt(s.seller),
            fulfillment = lit(s.fulfillment),
        )
    }
}

fn parse(base: &str) -> Result<Url, ScraperError> {
    Url::parse(base).map_err(|e| ScraperError::InvalidBaseUrl {
        base_url: base.to_owned(),
        reason: e.to_string(),
    })
}
