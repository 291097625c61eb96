//! crates/parts_finder_core/src/search.rs
//!
//! The parts search service. Composes the effective query from the request, then
//! asks each configured product source in turn, falling back to synthetic listings.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CachedResults, ResultCache};
use crate::catalog::synthetic_results;
use crate::domain::{Product, SearchOutcome, SearchRequest, SearchSource};
use crate::ports::{
    ImageDescriber, PortError, PortResult, ProductSearchProvider, RetailerScraper,
};
use crate::query::build_search_query;
use crate::relevance::filter_and_relabel;

/// The optional outside capabilities the search service can use. `None` means the
/// capability is not configured and the service degrades without it.
#[derive(Clone, Default)]
pub struct SearchBackends {
    pub provider: Option<Arc<dyn ProductSearchProvider>>,
    pub scraper: Option<Arc<dyn RetailerScraper>>,
    pub describer: Option<Arc<dyn ImageDescriber>>,
}

pub struct PartsSearchService {
    backends: SearchBackends,
    cache: ResultCache,
}

impl PartsSearchService {
    pub fn new(backends: SearchBackends, cache: ResultCache) -> Self {
        Self { backends, cache }
    }

    pub fn has_provider(&self) -> bool {
        self.backends.provider.is_some()
    }

    pub fn has_scraper(&self) -> bool {
        self.backends.scraper.is_some()
    }

    pub fn has_describer(&self) -> bool {
        self.backends.describer.is_some()
    }

    pub async fn search(&self, request: SearchRequest) -> PortResult<SearchOutcome> {
        let query = request
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty());
        let image = request.image.as_deref().filter(|img| !img.is_empty());

        if query.is_none() && image.is_none() {
            return Err(PortError::InvalidInput(
                "Provide a search term or an image".to_string(),
            ));
        }

        let image_description = match image {
            Some(bytes) => match self.describe(bytes).await {
                Ok(text) => {
                    info!("Image described as: {}", text);
                    Some(text)
                }
                Err(PortError::NotConfigured(what)) => {
                    debug!("No {} configured, image ignored", what);
                    None
                }
                Err(e) => {
                    warn!("Image analysis failed, continuing text-only: {:?}", e);
                    None
                }
            },
            None => None,
        };

        let effective_query =
            build_search_query(request.vehicle.as_ref(), query, image_description.as_deref());
        info!("Searching for: {}", effective_query);

        if let Some(hit) = self.cache.get(&effective_query) {
            debug!("Cache hit for '{}'", effective_query);
            return Ok(SearchOutcome {
                effective_query,
                products: hit.products,
                source: hit.source,
                image_description,
                cached: true,
            });
        }

        let (products, source) = self.fetch(&effective_query).await;
        self.cache.insert(
            &effective_query,
            CachedResults {
                products: products.clone(),
                source,
            },
        );

        Ok(SearchOutcome {
            effective_query,
            products,
            source,
            image_description,
            cached: false,
        })
    }

    /// Asks the vision model for a search phrase describing the photo.
    async fn describe(&self, image: &[u8]) -> PortResult<String> {
        let describer = self
            .backends
            .describer
            .as_ref()
            .ok_or_else(|| PortError::NotConfigured("vision model".to_string()))?;

        let text = describer.describe_image(image).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(PortError::Unexpected(
                "Vision model returned an empty description".to_string(),
            ));
        }
        Ok(text.to_string())
    }

    /// Paid API first, then the scraper, then synthetic listings.
    async fn fetch(&self, query: &str) -> (Vec<Product>, SearchSource) {
        if let Some(provider) = &self.backends.provider {
            match provider.search_products(query).await {
                Ok(raw) => {
                    let total = raw.len();
                    let relevant = filter_and_relabel(raw);
                    info!(
                        "Search API returned {} listings, {} automotive",
                        total,
                        relevant.len()
                    );
                    if !relevant.is_empty() {
                        return (relevant, SearchSource::Api);
                    }
                }
                Err(e) => warn!("Search API failed, falling back: {:?}", e),
            }
        }

        if let Some(scraper) = &self.backends.scraper {
            match scraper.scrape(query).await {
                Ok(found) if !found.is_empty() => {
                    info!("Scraped {} listings", found.len());
                    return (found, SearchSource::Scraped);
                }
                Ok(_) => info!("Scraper found nothing for '{}'", query),
                Err(e) => warn!("Scraping failed, falling back: {:?}", e),
            }
        }

        (synthetic_results(query), SearchSource::Demo)
    }
}
