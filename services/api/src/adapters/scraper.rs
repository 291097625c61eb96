//! services/api/src/adapters/scraper.rs
//!
//! This module contains the retailer scraper. It fetches a small fixed set of
//! retailer search pages, but only for allow-listed hosts whose robots.txt
//! permits the path. It implements the `RetailerScraper` port.

use async_trait::async_trait;
use dashmap::DashMap;
use futures::future::join_all;
use parts_finder_core::catalog::Retailer;
use parts_finder_core::domain::{format_price, Availability, PartType, Product, SearchSource};
use parts_finder_core::ports::{PortError, PortResult, RetailerScraper};
use regex::Regex;
use reqwest::{Client, StatusCode, Url};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info, warn};

use crate::adapters::http::USER_AGENT;
use crate::adapters::robots::RobotsRules;

/// Results read from each retailer page.
pub const MAX_ITEMS_PER_PAGE: usize = 3;

/// Ordered selector fallbacks; for each field the first selector that matches wins.
const CONTAINER_SELECTORS: &[&str] = &[
    "[data-testid='product-card']",
    ".product-card",
    ".product-item",
    ".search-result",
    "article",
];
const TITLE_SELECTORS: &[&str] = &[
    "[data-testid='product-title']",
    ".product-title",
    ".product-name",
    "h2 a",
    "h3",
];
const PRICE_SELECTORS: &[&str] = &[
    "[data-testid='product-price']",
    ".product-price",
    ".price",
    "[class*='price']",
];
const LINK_SELECTORS: &[&str] = &[
    "a[data-testid='product-link']",
    "a.product-link",
    "h2 a",
    "h3 a",
    "a[href]",
];

static PRICE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| {
        Regex::new(r"\$?\s*(\d{1,3}(?:,\d{3})*(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)").ok()
    });

/// One retailer search page the scraper may visit.
#[derive(Debug, Clone)]
pub struct ScrapeSite {
    pub retailer: Retailer,
    pub base_url: String,
}

impl ScrapeSite {
    /// The three retailers scraped in production, at their real addresses.
    pub fn defaults() -> Vec<ScrapeSite> {
        [Retailer::AutoZone, Retailer::AdvanceAutoParts, Retailer::OReilly]
            .into_iter()
            .map(|retailer| ScrapeSite {
                retailer,
                base_url: retailer.base_url().to_string(),
            })
            .collect()
    }

    fn search_url(&self, query: &str) -> PortResult<Url> {
        let raw = format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.retailer.search_path(query)
        );
        Url::parse(&raw)
            .map_err(|e| PortError::Unexpected(format!("Bad retailer URL {}: {}", raw, e)))
    }
}

/// Compiled selector fallbacks for one field.
struct SelectorChain(Vec<Selector>);

impl SelectorChain {
    fn compile(sources: &[&str]) -> Self {
        Self(
            sources
                .iter()
                .filter_map(|s| match Selector::parse(s) {
                    Ok(sel) => Some(sel),
                    Err(e) => {
                        warn!("Skipping invalid selector {}: {}", s, e);
                        None
                    }
                })
                .collect(),
        )
    }

    fn first_match<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.0.iter().find_map(|sel| scope.select(sel).next())
    }
}

struct Selectors {
    container: Vec<Selector>,
    title: SelectorChain,
    price: SelectorChain,
    link: SelectorChain,
}

impl Selectors {
    fn compile() -> Self {
        Self {
            container: SelectorChain::compile(CONTAINER_SELECTORS).0,
            title: SelectorChain::compile(TITLE_SELECTORS),
            price: SelectorChain::compile(PRICE_SELECTORS),
            link: SelectorChain::compile(LINK_SELECTORS),
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

pub struct EthicalScraper {
    client: Client,
    sites: Vec<ScrapeSite>,
    allowed_hosts: HashSet<String>,
    robots: DashMap<String, Arc<RobotsRules>>,
    selectors: Selectors,
}

impl EthicalScraper {
    /// A scraper for `sites` that will only contact the known retailers' own
    /// domains, whatever base URLs the sites name.
    pub fn new(client: Client, sites: Vec<ScrapeSite>) -> Self {
        Self {
            client,
            sites,
            allowed_hosts: origin_keys(Retailer::ALL.iter().map(Retailer::base_url)),
            robots: DashMap::new(),
            selectors: Selectors::compile(),
        }
    }

    /// Replaces the host allow-list with the given origins (`scheme://host[:port]`).
    pub fn with_allowed_origins<I, S>(mut self, origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_hosts = origin_keys(origins);
        self
    }

    fn is_allowed_host(&self, url: &Url) -> bool {
        host_key(url).is_some_and(|host| self.allowed_hosts.contains(&host))
    }

    /// robots.txt rules for the URL's host. Definitive answers are remembered per host.
    async fn robots_for(&self, url: &Url) -> Arc<RobotsRules> {
        let Some(host) = host_key(url) else {
            return Arc::new(RobotsRules::deny_all());
        };
        if let Some(rules) = self.robots.get(&host) {
            return rules.clone();
        }

        let fetched = self.fetch_robots(url).await;
        let rules = Arc::new(fetched.rules);
        if fetched.definitive {
            self.robots.insert(host, rules.clone());
        }
        rules
    }

    /// A missing robots.txt (4xx other than 401/403) allows everything. Server
    /// errors and network failures deny, and are retried on the next search.
    async fn fetch_robots(&self, url: &Url) -> FetchedRobots {
        let Ok(robots_url) = url.join("/robots.txt") else {
            return FetchedRobots::retry_later(RobotsRules::deny_all());
        };

        match self.client.get(robots_url.clone()).send().await {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(text) => FetchedRobots::cache(RobotsRules::parse(&text, USER_AGENT)),
                Err(e) => {
                    warn!("Could not read {}: {}", robots_url, e);
                    FetchedRobots::retry_later(RobotsRules::deny_all())
                }
            },
            Ok(resp)
                if resp.status() == StatusCode::UNAUTHORIZED
                    || resp.status() == StatusCode::FORBIDDEN =>
            {
                FetchedRobots::cache(RobotsRules::deny_all())
            }
            Ok(resp) if resp.status().is_server_error() => {
                warn!("{} returned {}, treating as disallowed", robots_url, resp.status());
                FetchedRobots::retry_later(RobotsRules::deny_all())
            }
            Ok(_) => FetchedRobots::cache(RobotsRules::allow_all()),
            Err(e) => {
                warn!("Could not fetch {}: {}", robots_url, e);
                FetchedRobots::retry_later(RobotsRules::deny_all())
            }
        }
    }

    async fn scrape_site(&self, site: &ScrapeSite, query: &str) -> PortResult<Vec<Product>> {
        let url = site.search_url(query)?;

        if !self.is_allowed_host(&url) {
            return Err(PortError::InvalidInput(format!("{} is not on the allow-list", url)));
        }

        let path_and_query = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };
        if !self.robots_for(&url).await.is_allowed(&path_and_query) {
            info!("robots.txt disallows {}", url);
            return Ok(Vec::new());
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PortError::Transient(format!("{} unreachable: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(PortError::Transient(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Transient(format!("{} body unreadable: {}", url, e)))?;

        Ok(self.extract_products(&body, &url, site.retailer))
    }

    /// Reads up to `MAX_ITEMS_PER_PAGE` listings from a retailer page.
    fn extract_products(&self, html: &str, page_url: &Url, retailer: Retailer) -> Vec<Product> {
        let document = Html::parse_document(html);

        let containers: Vec<ElementRef> = self
            .selectors
            .container
            .iter()
            .map(|sel| document.select(sel).collect::<Vec<_>>())
            .find(|found| !found.is_empty())
            .unwrap_or_default();

        containers
            .into_iter()
            .take(MAX_ITEMS_PER_PAGE)
            .enumerate()
            .filter_map(|(i, card)| {
                let title = self
                    .selectors
                    .title
                    .first_match(card)
                    .map(element_text)
                    .filter(|t| !t.is_empty())?;
                let price = self
                    .selectors
                    .price
                    .first_match(card)
                    .and_then(|el| parse_price(&element_text(el)))?;
                let href = self
                    .selectors
                    .link
                    .first_match(card)
                    .and_then(|el| el.value().attr("href"))?;
                let link = page_url.join(href).ok()?;

                Some(Product {
                    product_id: format!(
                        "scraped_{}_{}",
                        retailer.name().to_lowercase().replace(|c: char| !c.is_alphanumeric(), ""),
                        i + 1
                    ),
                    part_type: PartType::from_title(&title),
                    title,
                    price,
                    price_display: format_price(price),
                    store: retailer.name().to_string(),
                    link: link.to_string(),
                    rating: None,
                    review_count: None,
                    availability: Availability::CheckStore,
                    origin: SearchSource::Scraped,
                })
            })
            .collect()
    }
}

#[async_trait]
impl RetailerScraper for EthicalScraper {
    async fn scrape(&self, query: &str) -> PortResult<Vec<Product>> {
        let pages = join_all(self.sites.iter().map(|site| self.scrape_site(site, query))).await;

        let mut products = Vec::new();
        for (site, page) in self.sites.iter().zip(pages) {
            match page {
                Ok(found) => {
                    debug!("{} yielded {} listings", site.retailer.name(), found.len());
                    products.extend(found);
                }
                Err(e) => warn!("Scraping {} failed: {:?}", site.retailer.name(), e),
            }
        }
        Ok(products)
    }
}

/// Outcome of one robots.txt fetch; only definitive answers are remembered.
struct FetchedRobots {
    rules: RobotsRules,
    definitive: bool,
}

impl FetchedRobots {
    fn cache(rules: RobotsRules) -> Self {
        Self {
            rules,
            definitive: true,
        }
    }

    fn retry_later(rules: RobotsRules) -> Self {
        Self {
            rules,
            definitive: false,
        }
    }
}

fn origin_keys<I, S>(origins: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    origins
        .into_iter()
        .filter_map(|origin| Url::parse(origin.as_ref()).ok())
        .filter_map(|url| host_key(&url))
        .collect()
}

/// `host:port` so that two local test servers are distinct hosts.
fn host_key(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();
    Some(match url.port_or_known_default() {
        Some(port) => format!("{}:{}", host, port),
        None => host,
    })
}

fn element_text(el: ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pulls the first dollar amount out of display text like `Sale $1,249.99 ea`.
pub fn parse_price(text: &str) -> Option<f64> {
    let re = PRICE_RE.as_ref()?;
    let captured = re.captures(text)?.get(1)?.as_str().replace(',', "");
    captured.parse::<f64>().ok().filter(|p| *p > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const PAGE: &str = r#"
        <html><body>
          <div class="product-card">
            <h3 class="product-title">Duralast Gold Brake Pads</h3>
            <span class="price">$54.99</span>
            <a class="product-link" href="/p/brake-pads-1">View</a>
          </div>
          <div class="product-card">
            <div class="product-name">Genuine OEM Brake Pads</div>
            <div class="sale-price-block">Now $1,089.50</div>
            <h3><a href="https://shop.example/p/2">Details</a></h3>
          </div>
          <div class="product-card">
            <h3 class="product-title">No price here</h3>
            <a class="product-link" href="/p/3">View</a>
          </div>
          <div class="product-card">
            <h3 class="product-title">Fourth card is beyond the limit</h3>
            <span class="price">$9.99</span>
            <a class="product-link" href="/p/4">View</a>
          </div>
        </body></html>
    "#;

    fn scraper() -> EthicalScraper {
        let client = crate::adapters::http::create_client(Duration::from_secs(2)).unwrap();
        EthicalScraper::new(client, ScrapeSite::defaults())
    }

    #[test]
    fn extracts_with_selector_fallbacks() {
        let page_url = Url::parse("https://www.autozone.com/search?q=brake").unwrap();
        let products = scraper().extract_products(PAGE, &page_url, Retailer::AutoZone);

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Duralast Gold Brake Pads");
        assert_eq!(products[0].price, 54.99);
        assert_eq!(products[0].link, "https://www.autozone.com/p/brake-pads-1");
        assert_eq!(products[0].store, "AutoZone");
        assert_eq!(products[0].product_id, "scraped_autozone_1");

        assert_eq!(products[1].title, "Genuine OEM Brake Pads");
        assert_eq!(products[1].price, 1089.50);
        assert_eq!(products[1].link, "https://shop.example/p/2");
        assert_eq!(products[1].part_type, PartType::Oem);
    }

    #[test]
    fn page_without_known_containers_yields_nothing() {
        let page_url = Url::parse("https://www.autozone.com/").unwrap();
        let html = "<html><p>Nothing</p></html>";
        let products = scraper().extract_products(html, &page_url, Retailer::AutoZone);
        assert!(products.is_empty());
    }

    #[test]
    fn only_retailer_domains_are_allowed() {
        let s = scraper();
        assert!(s.is_allowed_host(&Url::parse("https://www.oreillyauto.com/search").unwrap()));
        assert!(s.is_allowed_host(&Url::parse("https://www.napaonline.com/search").unwrap()));
        assert!(!s.is_allowed_host(&Url::parse("http://www.autozone.com/").unwrap()));
        assert!(!s.is_allowed_host(&Url::parse("https://parts.example.com/").unwrap()));
    }

    #[test]
    fn site_outside_allow_list_is_refused() {
        let client = crate::adapters::http::create_client(Duration::from_secs(2)).unwrap();
        let site = ScrapeSite {
            retailer: Retailer::AutoZone,
            base_url: "https://mirror.example.com".to_string(),
        };
        let s = EthicalScraper::new(client, vec![site.clone()]);
        assert!(!s.is_allowed_host(&site.search_url("brake pads").unwrap()));

        let s = s.with_allowed_origins(["https://mirror.example.com"]);
        assert!(s.is_allowed_host(&site.search_url("brake pads").unwrap()));
    }

    #[test]
    fn prices_parse_from_display_text() {
        assert_eq!(parse_price("$29.99"), Some(29.99));
        assert_eq!(parse_price("Sale $1,249.99 ea"), Some(1249.99));
        assert_eq!(parse_price("Price: 7"), Some(7.0));
        assert_eq!(parse_price("Call for price"), None);
        assert_eq!(parse_price("$0.00"), None);
    }
}
