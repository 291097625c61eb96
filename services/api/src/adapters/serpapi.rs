//! services/api/src/adapters/serpapi.rs
//!
//! This module contains the adapter for the paid shopping search API (SerpAPI,
//! Google Shopping engine). It implements the `ProductSearchProvider` port.

use async_trait::async_trait;
use parts_finder_core::domain::{
    format_price, Availability, PartType, Product, SearchSource,
};
use parts_finder_core::ports::{PortError, PortResult, ProductSearchProvider};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

/// SerpAPI's free tier allows roughly this many searches a month.
const MONTHLY_QUOTA_ESTIMATE: u64 = 100;

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Deserialize)]
struct ShoppingResponse {
    #[serde(default)]
    shopping_results: Vec<ShoppingResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Deserialize)]
struct ShoppingResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    extracted_price: Option<f64>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    product_link: Option<String>,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    reviews: Option<u32>,
    #[serde(default)]
    product_id: Option<String>,
}

impl ShoppingResult {
    fn into_product(self, index: usize) -> Product {
        let price = self.extracted_price.unwrap_or(0.0);
        Product {
            product_id: self
                .product_id
                .unwrap_or_else(|| format!("api_product_{}", index + 1)),
            price_display: self.price.unwrap_or_else(|| format_price(price)),
            price,
            store: self.source.unwrap_or_default(),
            link: self.link.or(self.product_link).unwrap_or_default(),
            rating: self.rating,
            review_count: self.reviews,
            part_type: PartType::from_title(&self.title),
            availability: Availability::CheckStore,
            origin: SearchSource::Api,
            title: self.title,
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct SerpApiAdapter {
    client: Client,
    base_url: String,
    api_key: String,
    retry_backoff: Duration,
    requests_sent: AtomicU64,
}

impl SerpApiAdapter {
    pub fn new(client: Client, base_url: String, api_key: String, retry_backoff: Duration) -> Self {
        Self {
            client,
            base_url,
            api_key,
            retry_backoff,
            requests_sent: AtomicU64::new(0),
        }
    }

    /// Number of outbound requests issued since startup, retries included.
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }

    async fn send_once(&self, query: &str) -> PortResult<reqwest::Response> {
        let sent = self.requests_sent.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "Search API request #{} (~{} of an estimated {} monthly quota left)",
            sent,
            MONTHLY_QUOTA_ESTIMATE.saturating_sub(sent),
            MONTHLY_QUOTA_ESTIMATE
        );

        self.client
            .get(&self.base_url)
            .query(&[
                ("engine", "google_shopping"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("gl", "us"),
                ("hl", "en"),
                ("num", "20"),
            ])
            .send()
            .await
            .map_err(|e| PortError::Transient(format!("Search API unreachable: {}", e)))
    }
}

#[async_trait]
impl ProductSearchProvider for SerpApiAdapter {
    async fn search_products(&self, query: &str) -> PortResult<Vec<Product>> {
        let mut response = self.send_once(query).await?;

        // One retry, and only for rate limiting.
        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            warn!(
                "Search API rate limited, retrying once in {:?}",
                self.retry_backoff
            );
            tokio::time::sleep(self.retry_backoff).await;
            response = self.send_once(query).await?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::Transient(format!("Search API returned {}", status)));
        }

        let body: ShoppingResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Bad search API response: {}", e)))?;

        if let Some(err) = body.error {
            return Err(PortError::Transient(format!("Search API error: {}", err)));
        }

        Ok(body
            .shopping_results
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_product(i))
            .collect())
    }
}
