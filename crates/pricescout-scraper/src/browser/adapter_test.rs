use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use super::*;
use crate::browser::recipe;
use crate::browser::{BrowserEngine, BrowserLauncher};

/// What the fake page does at each step.
#[derive(Clone)]
struct Script {
    navigate_error: bool,
    items_present: bool,
    html: &'static str,
    extracted: serde_json::Value,
}

impl Script {
    fn with_items(extracted: serde_json::Value) -> Self {
        Self {
            navigate_error: false,
            items_present: true,
            html: "",
            extracted,
        }
    }

    fn without_items(html: &'static str) -> Self {
        Self {
            navigate_error: false,
            items_present: false,
            html,
            extracted: json!([]),
        }
    }
}

struct FakePage {
    script: Script,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScraperError> {
        if self.script.navigate_error {
            return Err(ScraperError::Timeout {
                url: url.to_owned(),
                secs: timeout.as_secs(),
            });
        }
        Ok(())
    }

    async fn wait_for(&self, _selector: &str, _timeout: Duration) -> Result<bool, ScraperError> {
        Ok(self.script.items_present)
    }

    async fn evaluate(&self, _script: &str) -> Result<serde_json::Value, ScraperError> {
        Ok(self.script.extracted.clone())
    }

    async fn content(&self) -> Result<String, ScraperError> {
        Ok(self.script.html.to_owned())
    }

    async fn close(self: Box<Self>) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

struct FakeEngine {
    script: Script,
    opened: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserEngine for FakeEngine {
    async fn open_page(&self) -> Result<Box<dyn BrowserPage>, ScraperError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakePage {
            script: self.script.clone(),
            closes: Arc::clone(&self.closes),
        }))
    }

    async fn shutdown(&self) {}
}

struct FakeLauncher {
    script: Script,
    opened: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Arc<dyn BrowserEngine>, ScraperError> {
        Ok(Arc::new(FakeEngine {
            script: self.script.clone(),
            opened: Arc::clone(&self.opened),
            closes: Arc::clone(&self.closes),
        }))
    }
}

struct Harness {
    adapter: BrowserAdapter,
    opened: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

fn harness(recipe: PageRecipe, script: Script) -> Harness {
    let opened = Arc::new(AtomicUsize::new(0));
    let closes = Arc::new(AtomicUsize::new(0));
    let launcher = FakeLauncher {
        script,
        opened: Arc::clone(&opened),
        closes: Arc::clone(&closes),
    };
    let browser = Arc::new(LazyBrowser::new(Arc::new(launcher)));
    Harness {
        adapter: BrowserAdapter::new(recipe, browser, BrowserTimeouts::default()),
        opened,
        closes,
    }
}

fn request(limit: usize) -> SearchRequest<'static> {
    SearchRequest {
        query: "fone bluetooth",
        limit,
        max_price: None,
    }
}

fn amazon_items() -> serde_json::Value {
    json!([
        {
            "title": "Fone JBL Tune 520BT",
            "price_text": "R$ 249,90",
            "rating_text": "4,6 de 5 estrelas",
            "reviews_text": "5.210",
            "shipping_text": "Entrega GRÁTIS amanhã",
            "seller_text": null,
            "url": "https://www.amazon.com.br/dp/B0C1",
            "fulfilled": true
        },
        {
            "title": "Fone Genérico",
            "price_text": null,
            "rating_text": null,
            "reviews_text": null,
            "shipping_text": null,
            "seller_text": null,
            "url": null,
            "fulfilled": false
        },
        {
            "title": "Fone Edifier W820NB",
            "price_text": "R$ 399,00",
            "rating_text": "4,4 de 5 estrelas",
            "reviews_text": "(2,3 mil)",
            "shipping_text": "Frete R$ 19,90",
            "seller_text": null,
            "url": "https://www.amazon.com.br/dp/B0C2",
            "fulfilled": false
        }
    ])
}

#[tokio::test]
async fn extracts_listings_and_closes_page() {
    let h = harness(recipe::amazon(), Script::with_items(amazon_items()));
    let listings = h.adapter.search(&request(10)).await.unwrap();

    assert_eq!(listings.len(), 2, "item without price is dropped");
    let prime = &listings[0];
    assert_eq!(prime.source(), Source::Amazon);
    assert_eq!(prime.seller_name(), "Amazon.com.br");
    assert_eq!(prime.logistics(), LogisticsTier::Fulfillment);
    assert!(prime.free_shipping());
    assert_eq!(prime.rating(), Some(4.6));
    assert_eq!(prime.review_count(), Some(5210));

    let marketplace = &listings[1];
    assert_eq!(marketplace.seller_name(), "Vendedor Amazon");
    assert_eq!(marketplace.logistics(), LogisticsTier::Unknown);
    assert!(!marketplace.free_shipping());
    assert_eq!(marketplace.review_count(), Some(2300));

    assert_eq!(h.opened.load(Ordering::SeqCst), 1);
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn truncates_to_limit_and_applies_price_ceiling() {
    let h = harness(recipe::amazon(), Script::with_items(amazon_items()));
    let listings = h.adapter.search(&request(1)).await.unwrap();
    assert_eq!(listings.len(), 1);

    let mut req = request(10);
    req.max_price = Some("300".parse().unwrap());
    let listings = h.adapter.search(&req).await.unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].title(), "Fone JBL Tune 520BT");
}

#[tokio::test]
async fn captcha_page_is_blocked_and_page_is_closed() {
    let h = harness(
        recipe::amazon(),
        Script::without_items("<form action=\"/errors/validateCaptcha\">Digite os caracteres</form>"),
    );
    let err = h.adapter.search(&request(10)).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Blocked { ref indicator, .. } if indicator == "captcha"),
        "expected Blocked, got: {err:?}"
    );
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn genuine_empty_page_is_an_empty_success() {
    let h = harness(
        recipe::mercado_livre(),
        Script::without_items("<p>Não há anúncios que coincidam com a sua busca.</p>"),
    );
    let listings = h.adapter.search(&request(10)).await.unwrap();
    assert!(listings.is_empty());
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_layout_is_a_page_structure_error() {
    let h = harness(recipe::mercado_livre(), Script::without_items("<main></main>"));
    let err = h.adapter.search(&request(10)).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::PageStructure { ref selector, .. } if selector == "li.ui-search-layout__item"),
        "expected PageStructure, got: {err:?}"
    );
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn navigation_failure_still_closes_page() {
    let mut script = Script::with_items(json!([]));
    script.navigate_error = true;
    let h = harness(recipe::mercado_livre(), script);
    let err = h.adapter.search(&request(10)).await.unwrap_err();
    assert!(matches!(err, ScraperError::Timeout { .. }));
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_extraction_result_is_a_deserialize_error() {
    let h = harness(
        recipe::mercado_livre(),
        Script::with_items(json!({"not": "an array"})),
    );
    let err = h.adapter.search(&request(10)).await.unwrap_err();
    assert!(matches!(err, ScraperError::Deserialize { .. }));
    assert_eq!(h.closes.load(Ordering::SeqCst), 1);
}

#[test]
fn mercado_livre_item_keeps_named_seller_and_full_badge() {
    let item = ScrapedItem {
        title: Some("Liquidificador Oster 1400W".to_owned()),
        price_text: Some("1.299,90".to_owned()),
        rating_text: Some("4.8".to_owned()),
        reviews_text: Some("(321)".to_owned()),
        shipping_text: Some("Chegará grátis amanhã".to_owned()),
        seller_text: Some("Por Oster ".to_owned()),
        url: Some("https://produto.mercadolivre.com.br/MLB-1".to_owned()),
        fulfilled: true,
    };
    let listing = listing_from_scraped(&recipe::mercado_livre(), item).unwrap();
    assert_eq!(listing.seller_name(), "Por Oster");
    assert_eq!(listing.logistics(), LogisticsTier::Fulfillment);
    assert!(listing.free_shipping());
    assert_eq!(listing.review_count(), Some(321));
    assert_eq!(listing.condition(), Condition::New);
}

#[test]
fn refurbished_item_is_used() {
    let item = ScrapedItem {
        title: Some("iPhone 12 Recondicionado".to_owned()),
        price_text: Some("2.199".to_owned()),
        ..ScrapedItem::default()
    };
    let listing = listing_from_scraped(&recipe::mercado_livre(), item).unwrap();
    assert_eq!(listing.condition(), Condition::Used);
    assert_eq!(listing.seller_name(), "Vendedor ML");
}
