//! Integration tests for the outbound adapters using wiremock
//!
//! These tests mock the search API, the identity provider, a retailer site and
//! the vision model to verify each adapter's HTTP behavior.

use api_lib::adapters::{
    http::create_client, EthicalScraper, FirebaseIdentityAdapter, OpenAiVisionAdapter,
    ScrapeSite, SerpApiAdapter,
};
use async_openai::{config::OpenAIConfig, Client};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use parts_finder_core::catalog::Retailer;
use parts_finder_core::domain::{SearchRequest, SearchSource};
use parts_finder_core::ports::{
    CredentialVerifier, ImageDescriber, PortError, ProductSearchProvider, RetailerScraper,
};
use parts_finder_core::{PartsSearchService, ResultCache, SearchBackends};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{
    matchers::{body_string_contains, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn client() -> reqwest::Client {
    create_client(Duration::from_secs(5)).unwrap()
}

fn serpapi(server: &MockServer) -> SerpApiAdapter {
    SerpApiAdapter::new(
        client(),
        format!("{}/search", server.uri()),
        "test-key".to_string(),
        Duration::from_millis(10),
    )
}

fn shopping_body() -> serde_json::Value {
    serde_json::json!({
        "shopping_results": [
            {
                "title": "OEM Ceramic Brake Pads Front Set",
                "price": "$54.99",
                "extracted_price": 54.99,
                "source": "AutoZone",
                "link": "https://www.autozone.com/p/1",
                "rating": 4.6,
                "reviews": 812
            },
            {
                "title": "Yoga Mat Extra Thick",
                "price": "$19.99",
                "extracted_price": 19.99,
                "source": "Sports Store",
                "link": "https://sports.example/p/2"
            },
            {
                "title": "Brake Rotor Pair",
                "extracted_price": 89.5,
                "link": "https://parts.example/p/3"
            }
        ]
    })
}

//=========================================================================================
// Search API
//=========================================================================================

#[tokio::test]
async fn test_serpapi_sends_expected_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("engine", "google_shopping"))
        .and(query_param("q", "brake pads"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("gl", "us"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shopping_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let products = serpapi(&mock_server).search_products("brake pads").await.unwrap();

    assert_eq!(products.len(), 3);
    assert_eq!(products[0].title, "OEM Ceramic Brake Pads Front Set");
    assert_eq!(products[0].price, 54.99);
    assert_eq!(products[0].price_display, "$54.99");
    assert_eq!(products[0].store, "AutoZone");
    assert_eq!(products[0].review_count, Some(812));
    assert_eq!(products[2].price_display, "$89.50");
}

#[tokio::test]
async fn test_serpapi_retries_once_after_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shopping_body()))
        .mount(&mock_server)
        .await;

    let adapter = serpapi(&mock_server);
    let products = adapter.search_products("brake pads").await.unwrap();

    assert_eq!(products.len(), 3);
    assert_eq!(adapter.requests_sent(), 2);
}

#[tokio::test]
async fn test_serpapi_gives_up_after_second_rate_limit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(429))
        .expect(2)
        .mount(&mock_server)
        .await;

    let adapter = serpapi(&mock_server);
    let err = adapter.search_products("brake pads").await.unwrap_err();

    assert!(matches!(err, PortError::Transient(_)));
    assert_eq!(adapter.requests_sent(), 2);
}

#[tokio::test]
async fn test_serpapi_server_error_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = serpapi(&mock_server).search_products("brake pads").await.unwrap_err();
    assert!(matches!(err, PortError::Transient(_)));
}

#[tokio::test]
async fn test_serpapi_error_field_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "error": "Invalid API key." })),
        )
        .mount(&mock_server)
        .await;

    let err = serpapi(&mock_server).search_products("brake pads").await.unwrap_err();
    assert!(matches!(err, PortError::Transient(msg) if msg.contains("Invalid API key")));
}

#[tokio::test]
async fn test_search_service_filters_api_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(shopping_body()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = PartsSearchService::new(
        SearchBackends {
            provider: Some(Arc::new(serpapi(&mock_server))),
            ..Default::default()
        },
        ResultCache::default(),
    );

    let request = SearchRequest {
        query: Some("brake pads".to_string()),
        ..Default::default()
    };
    let outcome = service.search(request.clone()).await.unwrap();

    assert_eq!(outcome.source, SearchSource::Api);
    let titles: Vec<&str> = outcome.products.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(titles, vec!["OEM Ceramic Brake Pads Front Set", "Brake Rotor Pair"]);
    assert_eq!(outcome.products[1].store, "Online Retailer");
    assert!(outcome.products.iter().all(|p| p.origin == SearchSource::Api));

    // The second identical search is served from the cache (the mock expects one call).
    let again = service.search(request).await.unwrap();
    assert!(again.cached);
    assert_eq!(again.products.len(), 2);
}

//=========================================================================================
// Identity Provider
//=========================================================================================

fn identity(server: &MockServer) -> FirebaseIdentityAdapter {
    FirebaseIdentityAdapter::new(client(), format!("{}/v1", server.uri()), "web-key".to_string())
}

#[tokio::test]
async fn test_identity_success_maps_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "web-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "localId": "uid-42",
            "email": "mechanic@garage.com",
            "displayName": "",
            "idToken": "token-abc"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let user = identity(&mock_server)
        .verify("mechanic@garage.com", "hunter22")
        .await
        .unwrap();

    assert_eq!(user.user_id, "uid-42");
    assert_eq!(user.email, "mechanic@garage.com");
    assert_eq!(user.display_name, "mechanic");
    assert_eq!(user.id_token.as_deref(), Some("token-abc"));
}

#[tokio::test]
async fn test_identity_bad_password_is_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 400, "message": "INVALID_PASSWORD" }
        })))
        .mount(&mock_server)
        .await;

    let err = identity(&mock_server)
        .verify("mechanic@garage.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Unauthorized));
}

#[tokio::test]
async fn test_identity_throttling_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "code": 400, "message": "TOO_MANY_ATTEMPTS_TRY_LATER : Access disabled" }
        })))
        .mount(&mock_server)
        .await;

    let err = identity(&mock_server)
        .verify("mechanic@garage.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Transient(_)));
}

//=========================================================================================
// Retailer Scraper
//=========================================================================================

const RESULTS_PAGE: &str = r#"
<html><body>
  <div class="product-card">
    <h3 class="product-title">Duralast Brake Pads</h3>
    <span class="price">$39.99</span>
    <a class="product-link" href="/p/duralast-pads">View</a>
  </div>
  <div class="product-card">
    <h3 class="product-title">Duralast Gold Brake Pads</h3>
    <span class="price">$59.99</span>
    <a class="product-link" href="/p/gold-pads">View</a>
  </div>
</body></html>
"#;

fn autozone_at(server: &MockServer) -> Vec<ScrapeSite> {
    vec![ScrapeSite {
        retailer: Retailer::AutoZone,
        base_url: server.uri(),
    }]
}

fn scraper_for(server: &MockServer) -> EthicalScraper {
    EthicalScraper::new(client(), autozone_at(server)).with_allowed_origins([server.uri()])
}

#[tokio::test]
async fn test_scraper_reads_permitted_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /cart\n"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/auto-parts/search"))
        .and(query_param("query", "brake pads"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(2)
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    let products = scraper.scrape("brake pads").await.unwrap();

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].title, "Duralast Brake Pads");
    assert_eq!(products[0].store, "AutoZone");
    assert_eq!(products[0].origin, SearchSource::Scraped);
    assert_eq!(products[0].link, format!("{}/p/duralast-pads", mock_server.uri()));

    // robots.txt is fetched once per host.
    scraper.scrape("brake pads").await.unwrap();
}

#[tokio::test]
async fn test_scraper_respects_robots_disallow() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /c/\n"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/auto-parts/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let products = scraper_for(&mock_server).scrape("brake pads").await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_scraper_treats_forbidden_robots_as_deny() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/auto-parts/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let products = scraper_for(&mock_server).scrape("brake pads").await.unwrap();
    assert!(products.is_empty());
}

#[tokio::test]
async fn test_scraper_missing_robots_allows() {
    let mock_server = MockServer::start().await;

    // No robots.txt mock: wiremock answers 404.
    Mock::given(method("GET"))
        .and(path("/c/auto-parts/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(1)
        .mount(&mock_server)
        .await;

    let products = scraper_for(&mock_server).scrape("brake pads").await.unwrap();
    assert_eq!(products.len(), 2);
}

#[tokio::test]
async fn test_scraper_server_error_robots_denies_and_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/c/auto-parts/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scraper = scraper_for(&mock_server);
    assert!(scraper.scrape("brake pads").await.unwrap().is_empty());
    // The 503 is not remembered, so robots.txt is asked for again.
    assert!(scraper.scrape("brake pads").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_scraper_skips_hosts_outside_retailer_domains() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(RESULTS_PAGE))
        .expect(0)
        .mount(&mock_server)
        .await;

    let scraper = EthicalScraper::new(client(), autozone_at(&mock_server));
    assert!(scraper.scrape("brake pads").await.unwrap().is_empty());
}

//=========================================================================================
// Vision Model
//=========================================================================================

fn vision(server: &MockServer, timeout: Duration) -> OpenAiVisionAdapter {
    let config = OpenAIConfig::new()
        .with_api_key("test-key")
        .with_api_base(server.uri());
    OpenAiVisionAdapter::new(Client::with_config(config), "gpt-4o-mini".to_string(), timeout)
}

fn photo() -> Vec<u8> {
    let buffer = ImageBuffer::from_pixel(64, 48, Rgb([120u8, 120, 130]));
    let mut out = std::io::Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(buffer)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

fn completion(text: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1_700_000_000,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": text },
            "finish_reason": "stop",
            "logprobs": null
        }],
        "usage": { "prompt_tokens": 90, "completion_tokens": 8, "total_tokens": 98 }
    })
}

#[tokio::test]
async fn test_vision_sends_prompt_with_inline_jpeg() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("\"model\":\"gpt-4o-mini\""))
        .and(body_string_contains("You are an automotive parts expert"))
        .and(body_string_contains("data:image/jpeg;base64,"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("\"front brake caliper\"\nThe piston boot is torn.")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let description = vision(&mock_server, Duration::from_secs(5))
        .describe_image(&photo())
        .await
        .unwrap();
    assert_eq!(description, "front brake caliper");
}

#[tokio::test]
async fn test_vision_server_error_is_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "error": {
                "message": "overloaded",
                "type": "server_error",
                "param": null,
                "code": null
            }
        })))
        .mount(&mock_server)
        .await;

    let err = vision(&mock_server, Duration::from_secs(1))
        .describe_image(&photo())
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::Transient(_)));
}

#[tokio::test]
async fn test_vision_rejects_non_image_without_calling_model() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("oil filter")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let err = vision(&mock_server, Duration::from_secs(5))
        .describe_image(b"not a photo")
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::InvalidInput(_)));
}
