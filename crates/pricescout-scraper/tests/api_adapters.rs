//! Integration tests for the structured-API adapters using wiremock HTTP mocks.

use std::sync::Arc;

use pricescout_core::{LogisticsTier, MlOAuthConfig, SellerTier, Source};
use pricescout_scraper::{
    AmazonApi, HttpSettings, ListingAdapter, MercadoLivreApi, ScraperError, SearchRequest, Tier,
    TokenProvider,
};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> HttpSettings {
    HttpSettings {
        timeout_secs: 5,
        user_agent: "pricescout-test".to_owned(),
    }
}

fn request(limit: usize) -> SearchRequest<'static> {
    SearchRequest {
        query: "liquidificador",
        limit,
        max_price: None,
    }
}

fn rapid_ml(base_url: &str) -> MercadoLivreApi {
    MercadoLivreApi::rapidapi_with_base_url(Some("rapid-key".to_owned()), &settings(), base_url)
        .expect("adapter construction should not fail")
}

// ---------------------------------------------------------------------------
// Mercado Livre via RapidAPI
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ml_rapidapi_maps_listings() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "search_results": 3,
        "page_results": 3,
        "data": [
            {
                "id": "MLB1",
                "title": "Liquidificador Philips Walita 1200W",
                "url": "https://produto.mercadolivre.com.br/MLB-1",
                "price": "1.299,90",
                "currency": "BRL",
                "rating": "4.8",
                "votes": "(2,3 mil)",
                "seller": "",
                "shipping": "Frete grátis FULL"
            },
            {
                "id": "MLB2",
                "title": "Liquidificador Mondial",
                "url": "https://produto.mercadolivre.com.br/MLB-2",
                "price": "",
                "rating": "",
                "votes": "",
                "seller": "",
                "shipping": ""
            },
            {
                "id": "MLB3",
                "title": "Liquidificador Oster",
                "url": "https://produto.mercadolivre.com.br/MLB-3",
                "price": "249.90",
                "rating": "",
                "votes": "",
                "seller": "OSTER OFICIAL",
                "shipping": "Frete R$ 19,90"
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/listings_for_search"))
        .and(query_param("search_str", "liquidificador"))
        .and(query_param("country", "br"))
        .and(query_param("sort_by", "relevance"))
        .and(query_param("page_num", "1"))
        .and(header("X-RapidAPI-Key", "rapid-key"))
        .and(header("X-RapidAPI-Host", "mercado-libre7.p.rapidapi.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = rapid_ml(&server.uri());
    assert_eq!(adapter.source(), Source::Ml);
    assert_eq!(adapter.tier(), Tier::Api);

    let listings = adapter.search(&request(10)).await.expect("should parse");
    assert_eq!(listings.len(), 2, "listing with blank price is dropped");

    let first = &listings[0];
    assert_eq!(first.title(), "Liquidificador Philips Walita 1200W");
    assert_eq!(first.price(), "1299.90".parse().unwrap());
    assert_eq!(first.review_count(), Some(2300));
    assert!(first.free_shipping());
    assert_eq!(first.logistics(), LogisticsTier::Fulfillment);
    assert_eq!(first.seller_name(), "Vendedor ML");

    let second = &listings[1];
    assert!(second.rating().is_none());
    assert!(second.review_count().is_none());
    assert_eq!(second.seller_name(), "OSTER OFICIAL");
}

#[tokio::test]
async fn ml_rapidapi_applies_price_ceiling_and_limit_locally() {
    let server = MockServer::start().await;

    let items: Vec<_> = (1..=5)
        .map(|i| {
            serde_json::json!({
                "id": format!("MLB{i}"),
                "title": format!("Liquidificador {i}"),
                "url": "",
                "price": format!("{}0,00", i * 10),
                "shipping": ""
            })
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/listings_for_search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "data": items })),
        )
        .mount(&server)
        .await;

    let adapter = rapid_ml(&server.uri());
    let mut req = request(2);
    req.max_price = Some("300".parse().unwrap());
    let listings = adapter.search(&req).await.unwrap();

    assert_eq!(listings.len(), 2);
    assert!(listings.iter().all(|l| l.price() <= "300".parse().unwrap()));
}

#[tokio::test]
async fn ml_rapidapi_without_key_reports_missing_credentials() {
    let adapter = MercadoLivreApi::rapidapi_with_base_url(None, &settings(), "http://127.0.0.1:9")
        .expect("construction should not fail");
    let err = adapter.search(&request(10)).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::MissingCredentials { var: "RAPIDAPI_KEY", .. }),
        "expected MissingCredentials, got: {err:?}"
    );
}

#[tokio::test]
async fn ml_rapidapi_forbidden_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = rapid_ml(&server.uri())
        .search(&request(10))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::Auth { status: 403, .. }),
        "expected Auth, got: {err:?}"
    );
}

#[tokio::test]
async fn ml_rapidapi_server_error_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = rapid_ml(&server.uri())
        .search(&request(10))
        .await
        .unwrap_err();
    assert!(
        matches!(err, ScraperError::UnexpectedStatus { status: 503, .. }),
        "expected UnexpectedStatus, got: {err:?}"
    );
    assert!(
        !err.to_string().contains("liquidificador"),
        "query string should be stripped from the error: {err}"
    );
}

#[tokio::test]
async fn ml_rapidapi_malformed_body_is_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = rapid_ml(&server.uri())
        .search(&request(10))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::Deserialize { .. }));
}

#[tokio::test]
async fn ml_rapidapi_slow_response_is_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": [] }))
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let fast = HttpSettings {
        timeout_secs: 1,
        user_agent: "pricescout-test".to_owned(),
    };
    let adapter =
        MercadoLivreApi::rapidapi_with_base_url(Some("k".to_owned()), &fast, &server.uri())
            .unwrap();
    let err = adapter.search(&request(10)).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Timeout { secs: 1, .. }),
        "expected Timeout, got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Mercado Livre official API
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ml_official_uses_bearer_token_and_maps_reputation() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("ml-token.json");

    let token = serde_json::json!({
        "access_token": "APP_USR-cached",
        "refresh_token": "TG-stored",
        "expires_at": (chrono::Utc::now() + chrono::Duration::hours(5)).to_rfc3339()
    });
    std::fs::write(&token_path, token.to_string()).unwrap();

    let body = serde_json::json!({
        "results": [
            {
                "id": "MLB10",
                "title": "Liquidificador Oster 1400W",
                "price": 329.9,
                "condition": "new",
                "permalink": "https://produto.mercadolivre.com.br/MLB-10",
                "shipping": { "free_shipping": true, "logistic_type": "fulfillment" },
                "seller": { "nickname": "OSTER", "power_seller_status": null },
                "reviews": { "rating_average": 4.7, "total": 912 },
                "official_store_id": 77,
                "official_store_name": "Oster"
            },
            {
                "id": "MLB11",
                "title": "Liquidificador Arno",
                "price": 189.0,
                "condition": "new",
                "permalink": "https://produto.mercadolivre.com.br/MLB-11",
                "shipping": { "free_shipping": false, "logistic_type": "drop_off" },
                "seller": { "nickname": "LOJAX", "reputation": { "power_seller_status": "gold" } },
                "official_store_id": null
            }
        ]
    });

    Mock::given(method("GET"))
        .and(path("/sites/MLB/search"))
        .and(query_param("q", "liquidificador"))
        .and(query_param("sort", "price_asc"))
        .and(query_param("limit", "10"))
        .and(query_param("price", "*-400"))
        .and(header("Authorization", "Bearer APP_USR-cached"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let config = MlOAuthConfig {
        app_id: "123".to_owned(),
        app_secret: "secret".to_owned(),
        refresh_token: "TG-env".to_owned(),
        token_path,
    };
    let tokens =
        TokenProvider::with_base_url(&config, 5, "pricescout-test", &server.uri()).unwrap();
    let adapter =
        MercadoLivreApi::official_with_base_url(Arc::new(tokens), &settings(), &server.uri())
            .unwrap();

    let mut req = request(10);
    req.max_price = Some("400".parse().unwrap());
    let listings = adapter.search(&req).await.expect("should parse");

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].seller_tier(), SellerTier::OfficialStore);
    assert_eq!(listings[0].seller_name(), "Oster");
    assert_eq!(listings[0].logistics(), LogisticsTier::Fulfillment);
    assert_eq!(listings[0].rating(), Some(4.7));
    assert_eq!(listings[1].seller_tier(), SellerTier::Gold);
    assert_eq!(listings[1].logistics(), LogisticsTier::DropOff);
}

#[tokio::test]
async fn ml_official_unauthorized_is_auth_error() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("ml-token.json");
    let token = serde_json::json!({
        "access_token": "APP_USR-revoked",
        "refresh_token": "TG-stored",
        "expires_at": (chrono::Utc::now() + chrono::Duration::hours(5)).to_rfc3339()
    });
    std::fs::write(&token_path, token.to_string()).unwrap();

    Mock::given(method("GET"))
        .and(path("/sites/MLB/search"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let config = MlOAuthConfig {
        app_id: "123".to_owned(),
        app_secret: "secret".to_owned(),
        refresh_token: "TG-env".to_owned(),
        token_path,
    };
    let tokens =
        TokenProvider::with_base_url(&config, 5, "pricescout-test", &server.uri()).unwrap();
    let adapter =
        MercadoLivreApi::official_with_base_url(Arc::new(tokens), &settings(), &server.uri())
            .unwrap();

    let err = adapter.search(&request(10)).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::Auth { status: 401, .. }),
        "expected Auth, got: {err:?}"
    );
}

// ---------------------------------------------------------------------------
// Amazon via RapidAPI
// ---------------------------------------------------------------------------

#[tokio::test]
async fn amazon_maps_prime_and_marketplace_products() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "status": "OK",
        "data": {
            "products": [
                {
                    "product_title": "Fone de Ouvido JBL Tune 520BT",
                    "product_price": "R$ 249,90",
                    "product_star_rating": "4.6",
                    "product_num_ratings": 5210,
                    "product_url": "https://www.amazon.com.br/dp/B0C1",
                    "delivery": "Entrega amanhã",
                    "is_prime": true
                },
                {
                    "product_title": "Fone Bluetooth Genérico",
                    "product_price": "R$ 59,90",
                    "product_star_rating": null,
                    "product_num_ratings": 0,
                    "product_url": "https://www.amazon.com.br/dp/B0C2",
                    "delivery": "Frete GRÁTIS",
                    "is_prime": false
                },
                {
                    "product_title": "Fone Indisponível",
                    "product_price": null,
                    "is_prime": false
                }
            ]
        }
    });

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("query", "fone bluetooth"))
        .and(query_param("country", "BR"))
        .and(query_param("sort_by", "RELEVANCE"))
        .and(query_param("page", "1"))
        .and(query_param("max_price", "300"))
        .and(header("X-RapidAPI-Host", "real-time-amazon-data.p.rapidapi.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(1)
        .mount(&server)
        .await;

    let adapter =
        AmazonApi::with_base_url(Some("rapid-key".to_owned()), &settings(), &server.uri()).unwrap();
    assert_eq!(adapter.source(), Source::Amazon);

    let req = SearchRequest {
        query: "fone bluetooth",
        limit: 10,
        max_price: Some("300".parse().unwrap()),
    };
    let listings = adapter.search(&req).await.expect("should parse");

    assert_eq!(listings.len(), 2);
    assert_eq!(listings[0].seller_name(), "Amazon.com.br");
    assert_eq!(listings[0].logistics(), LogisticsTier::Fulfillment);
    assert!(listings[0].free_shipping());
    assert_eq!(listings[1].seller_name(), "Vendedor Amazon");
    assert_eq!(listings[1].logistics(), LogisticsTier::Unknown);
    assert!(listings[1].free_shipping(), "free-delivery label counts");
    assert!(listings[1].rating().is_none());
}

#[tokio::test]
async fn amazon_without_data_envelope_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "OK"})))
        .mount(&server)
        .await;

    let adapter =
        AmazonApi::with_base_url(Some("k".to_owned()), &settings(), &server.uri()).unwrap();
    let listings = adapter.search(&request(10)).await.unwrap();
    assert!(listings.is_empty());
}

#[tokio::test]
async fn amazon_without_key_reports_missing_credentials() {
    let adapter = AmazonApi::with_base_url(None, &settings(), "http://127.0.0.1:9").unwrap();
    let err = adapter.search(&request(10)).await.unwrap_err();
    assert!(
        matches!(err, ScraperError::MissingCredentials { adapter: "amazon-api", .. }),
        "expected MissingCredentials, got: {err:?}"
    );
}
