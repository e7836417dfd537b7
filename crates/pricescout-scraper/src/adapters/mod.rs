//! The `(source, tier)` adapter abstraction and the registry that wires
//! concrete adapters from configuration.

pub mod amazon;
pub mod mercadolivre;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use pricescout_core::{AppConfig, RawListing, Source};
use rust_decimal::Decimal;

use crate::browser::chromium::ChromiumLauncher;
use crate::browser::{recipe, BrowserAdapter, BrowserTimeouts, LazyBrowser};
use crate::error::ScraperError;
use crate::token::TokenProvider;

pub use amazon::AmazonApi;
pub use mercadolivre::MercadoLivreApi;

/// Ceiling for the Amazon API tier; it answers slower than it is worth waiting on.
pub const AMAZON_API_TIMEOUT_SECS: u64 = 15;

/// Acquisition method, in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    /// Keyed or public JSON search endpoint.
    Api,
    /// Headless browser against the consumer search page.
    Browser,
}

impl Tier {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Api => "api",
            Tier::Browser => "browser",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-source search parameters.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    /// Listings returned per source are truncated to this many.
    pub limit: usize,
    /// Passed to endpoints that support server-side price ceilings.
    pub max_price: Option<Decimal>,
}

/// Timeout and `User-Agent` shared by the HTTP adapters.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
}

/// One way of getting listings for one source.
#[async_trait]
pub trait ListingAdapter: Send + Sync {
    fn source(&self) -> Source;

    fn tier(&self) -> Tier;

    /// Searches the source and returns at most `request.limit` listings.
    ///
    /// Offers whose title or price cannot be parsed are dropped, not errors.
    async fn search(&self, request: &SearchRequest<'_>) -> Result<Vec<RawListing>, ScraperError>;
}

/// All adapters available for a query, plus the shared browser they may use.
#[derive(Default)]
pub struct SourceRegistry {
    adapters: Vec<Arc<dyn ListingAdapter>>,
    browser: Option<Arc<LazyBrowser>>,
}

impl SourceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the production adapter set.
    ///
    /// Mercado Livre uses the official OAuth API when credentials are
    /// configured and the RapidAPI mirror otherwise. Browser adapters share a
    /// single lazily launched Chromium and are skipped entirely when the
    /// browser tier is disabled.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Http`] if an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ScraperError> {
        let api_settings = HttpSettings {
            timeout_secs: config.api_timeout_secs,
            user_agent: config.user_agent.clone(),
        };
        let amazon_settings = HttpSettings {
            timeout_secs: config.api_timeout_secs.min(AMAZON_API_TIMEOUT_SECS),
            user_agent: config.user_agent.clone(),
        };

        let mut registry = Self::new();

        let ml_api = match &config.ml_oauth {
            Some(oauth) => {
                let tokens =
                    TokenProvider::new(oauth, config.api_timeout_secs, &config.user_agent)?;
                MercadoLivreApi::official(Arc::new(tokens), &api_settings)?
            }
            None => MercadoLivreApi::rapidapi(config.rapidapi_key.clone(), &api_settings)?,
        };
        registry.register(Arc::new(ml_api));
        registry.register(Arc::new(AmazonApi::new(
            config.rapidapi_key.clone(),
            &amazon_settings,
        )?));

        if config.browser_enabled {
            let launcher =
                ChromiumLauncher::new(config.chrome_path.clone(), config.user_agent.clone());
            let browser = Arc::new(LazyBrowser::new(Arc::new(launcher)));
            let timeouts = BrowserTimeouts::with_navigation_secs(config.browser_timeout_secs);

            registry.register(Arc::new(BrowserAdapter::new(
                recipe::mercado_livre(),
                Arc::clone(&browser),
                timeouts,
            )));
            registry.register(Arc::new(BrowserAdapter::new(
                recipe::amazon(),
                Arc::clone(&browser),
                timeouts,
            )));
            registry.browser = Some(browser);
        }

        Ok(registry)
    }

    pub fn register(&mut self, adapter: Arc<dyn ListingAdapter>) {
        self.adapters.push(adapter);
    }

    /// Attaches the browser that [`SourceRegistry::release`] shuts down.
    pub fn set_browser(&mut self, browser: Arc<LazyBrowser>) {
        self.browser = Some(browser);
    }

    /// Adapters for `source`, API tier first.
    #[must_use]
    pub fn tiers_for(&self, source: Source) -> Vec<Arc<dyn ListingAdapter>> {
        let mut tiers: Vec<_> = self
            .adapters
            .iter()
            .filter(|a| a.source() == source)
            .cloned()
            .collect();
        tiers.sort_by_key(|a| a.tier());
        tiers
    }

    /// Shuts down the shared browser if one was launched.
    pub async fn release(&self) {
        if let Some(browser) = &self.browser {
            browser.shutdown().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stub {
        source: Source,
        tier: Tier,
    }

    #[async_trait]
    impl ListingAdapter for Stub {
        fn source(&self) -> Source {
            self.source
        }

        fn tier(&self) -> Tier {
            self.tier
        }

        async fn search(&self, _: &SearchRequest<'_>) -> Result<Vec<RawListing>, ScraperError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn tiers_for_orders_api_before_browser() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(Stub {
            source: Source::Ml,
            tier: Tier::Browser,
        }));
        registry.register(Arc::new(Stub {
            source: Source::Amazon,
            tier: Tier::Api,
        }));
        registry.register(Arc::new(Stub {
            source: Source::Ml,
            tier: Tier::Api,
        }));

        let tiers: Vec<Tier> = registry
            .tiers_for(Source::Ml)
            .iter()
            .map(|a| a.tier())
            .collect();
        assert_eq!(tiers, vec![Tier::Api, Tier::Browser]);
        assert_eq!(registry.tiers_for(Source::Amazon).len(), 1);
    }

    #[test]
    fn tier_labels() {
        assert_eq!(Tier::Api.to_string(), "api");
        assert_eq!(Tier::Browser.to_string(), "browser");
    }

    fn config(browser_enabled: bool) -> AppConfig {
        AppConfig {
            log_level: "warn".to_owned(),
            user_agent: "pricescout-test".to_owned(),
            rapidapi_key: None,
            ml_oauth: None,
            anthropic_api_key: None,
            relevance_model: "model".to_owned(),
            api_timeout_secs: 20,
            browser_enabled,
            browser_timeout_secs: 30,
            chrome_path: None,
            relevance_timeout_secs: 15,
        }
    }

    #[test]
    fn from_config_registers_browser_tier_when_enabled() {
        let registry = SourceRegistry::from_config(&config(true)).unwrap();
        assert_eq!(registry.tiers_for(Source::Ml).len(), 2);
        assert_eq!(registry.tiers_for(Source::Amazon).len(), 2);
        assert!(registry.browser.is_some());
    }

    #[test]
    fn from_config_skips_browser_tier_when_disabled() {
        let registry = SourceRegistry::from_config(&config(false)).unwrap();
        assert_eq!(registry.tiers_for(Source::Ml).len(), 1);
        assert_eq!(registry.tiers_for(Source::Amazon).len(), 1);
        assert!(registry.browser.is_none());
    }
}
