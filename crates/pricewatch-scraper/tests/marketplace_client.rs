//! Integration tests for `MarketplaceClient` against a local mock upstream.
//!
//! Each test stands up a `wiremock` server that plays all three upstream
//! surfaces (catalog, search, storefront), so no real network traffic is made.

use std::sync::Arc;

use pricewatch_core::{CategoryCatalog, CategoryConfig, PayloadFormat, Target};
use pricewatch_scraper::{
    classify, Classification, ListingSource, MarketplaceClient, MarketplaceUrls, ScraperError,
};
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TEST_UA: &str = "Mozilla/5.0 pricewatch-test";

fn catalog() -> CategoryCatalog {
    CategoryCatalog::new(vec![
        CategoryConfig {
            id: 3192,
            name: "Laptops".to_string(),
            shard: "electronic14".to_string(),
            query: "cat=3192".to_string(),
            path: None,
            format: PayloadFormat::Json,
        },
        CategoryConfig {
            id: 907,
            name: "Clothing".to_string(),
            shard: "women_clothes2".to_string(),
            query: "cat=907".to_string(),
            path: Some("/catalog/zhenshchinam/odezhda".to_string()),
            format: PayloadFormat::Html,
        },
    ])
    .expect("test catalog is valid")
}

/// Client pointed at `server` for every surface, no retries.
fn test_client(server: &MockServer) -> MarketplaceClient {
    test_client_with_retries(server, 0)
}

fn test_client_with_retries(server: &MockServer, max_retries: u32) -> MarketplaceClient {
    let urls = MarketplaceUrls {
        site: server.uri(),
        catalog: server.uri(),
        search: server.uri(),
    };
    MarketplaceClient::new(5, TEST_UA, max_retries, 0, urls, Arc::new(catalog()))
        .expect("failed to build test MarketplaceClient")
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn category_fetch_hits_catalog_endpoint_with_browser_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/electronic14/v2/catalog"))
        .and(query_param("cat", "3192"))
        .and(query_param("curr", "rub"))
        .and(header("user-agent", TEST_UA))
        .and(header("referer", format!("{}/", server.uri()).as_str()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"products": [{"id": 1, "name": "a", "priceU": 100}]}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let raw = test_client(&server)
        .fetch(&Target::Category(3192))
        .await
        .unwrap();

    assert_eq!(raw.status, 200);
    assert_eq!(raw.expected, PayloadFormat::Json);
    assert!(raw
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.contains("application/json")));
}

#[tokio::test]
async fn query_fetch_hits_search_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/exactmatch/ru/common/v4/search"))
        .and(query_param("query", "ноутбук"))
        .and(query_param("resultset", "catalog"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"products": []}})))
        .expect(1)
        .mount(&server)
        .await;

    let raw = test_client(&server)
        .fetch(&Target::Query("ноутбук".to_string()))
        .await
        .unwrap();

    assert!(matches!(classify(&raw), Classification::Empty));
}

#[tokio::test]
async fn html_category_fetches_storefront_page() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/catalog/zhenshchinam/odezhda"))
        .and(query_param("cat", "907"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(
                    r#"<html><body><div class="product-card" data-nm-id="5">
                       <span class="goods-name">Платье</span><ins class="price">2 990 ₽</ins>
                       </div></body></html>"#,
                ),
        )
        .mount(&server)
        .await;

    let raw = test_client(&server)
        .fetch(&Target::Category(907))
        .await
        .unwrap();

    assert_eq!(raw.expected, PayloadFormat::Html);
    assert!(matches!(classify(&raw), Classification::Success(_)));
}

// ---------------------------------------------------------------------------
// Non-2xx responses are data, not errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn forbidden_challenge_is_returned_unmodified() {
    let server = MockServer::start().await;
    let challenge = "<html><title>Почти готово...</title><div class=\"captcha\"></div></html>";

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string(challenge))
        .expect(1)
        .mount(&server)
        .await;

    let raw = test_client_with_retries(&server, 3)
        .fetch(&Target::Category(3192))
        .await
        .unwrap();

    assert_eq!(raw.status, 403);
    assert_eq!(raw.body, challenge);
    assert!(matches!(classify(&raw), Classification::Blocked));
}

#[tokio::test]
async fn server_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let raw = test_client_with_retries(&server, 3)
        .fetch(&Target::Category(3192))
        .await
        .unwrap();

    assert!(matches!(
        classify(&raw),
        Classification::ServerError { status: 503 }
    ));
}

#[tokio::test]
async fn challenge_page_with_200_classifies_as_blocked() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html")
                .set_body_string("<!DOCTYPE html><html><body>Checking your browser</body></html>"),
        )
        .mount(&server)
        .await;

    let raw = test_client(&server)
        .fetch(&Target::Query("tv".to_string()))
        .await
        .unwrap();

    assert_eq!(raw.status, 200);
    assert!(matches!(classify(&raw), Classification::Blocked));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connection_failure_is_network_error() {
    // Bind then release a port so nothing is listening on it.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let urls = MarketplaceUrls {
        site: base.clone(),
        catalog: base.clone(),
        search: base,
    };
    let client = MarketplaceClient::new(2, TEST_UA, 1, 0, urls, Arc::new(catalog())).unwrap();

    let err = client.fetch(&Target::Category(3192)).await.unwrap_err();
    assert!(err.is_network(), "expected network error, got {err:?}");
}

#[tokio::test]
async fn unknown_category_fails_without_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = test_client(&server)
        .fetch(&Target::Category(42))
        .await
        .unwrap_err();
    assert!(matches!(err, ScraperError::UnknownCategory(42)));
}
