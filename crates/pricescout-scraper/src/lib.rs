//! Listing acquisition for pricescout.
//!
//! Every source is reachable through one or more [`ListingAdapter`]s keyed by
//! `(source, tier)`. The structured-API tier talks to JSON search endpoints;
//! the browser tier drives headless Chromium against the consumer search page
//! and is only consulted when the API tier came back empty or failed.

pub mod adapters;
pub mod browser;
pub mod error;
pub mod normalize;
pub mod token;
pub mod types;

mod client;

pub use adapters::{
    AmazonApi, HttpSettings, ListingAdapter, MercadoLivreApi, SearchRequest, SourceRegistry, Tier,
};
pub use browser::chromium::ChromiumLauncher;
pub use browser::{
    BrowserAdapter, BrowserEngine, BrowserLauncher, BrowserPage, BrowserTimeouts, LazyBrowser,
    PageRecipe,
};
pub use error::ScraperError;
pub use token::{TokenError, TokenProvider};
