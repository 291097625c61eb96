//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and how it is assembled from the
//! configuration.

use crate::adapters::{
    http::create_client, EthicalScraper, FirebaseIdentityAdapter, InMemoryCredentialVerifier,
    InMemorySessionStore, OpenAiVisionAdapter, ScrapeSite, SerpApiAdapter,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::web::cookie::SessionCookies;
use async_openai::{config::OpenAIConfig, Client};
use parts_finder_core::ports::{
    CredentialVerifier, ImageDescriber, ProductSearchProvider, RetailerScraper,
};
use parts_finder_core::{Authenticator, PartsSearchService, ResultCache, SearchBackends};
use std::sync::Arc;
use tracing::{info, warn};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
pub struct AppState {
    pub config: Arc<Config>,
    pub authenticator: Authenticator,
    pub search: PartsSearchService,
    pub cookies: SessionCookies,
    /// Whether logins are checked against the remote identity provider.
    pub remote_identity: bool,
}

impl AppState {
    /// Builds the state from already-constructed services.
    pub fn new(
        config: Arc<Config>,
        authenticator: Authenticator,
        search: PartsSearchService,
        remote_identity: bool,
    ) -> Self {
        let cookies = SessionCookies::new(
            &config.secret_key,
            config.session_lifetime_secs,
            config.cookie_secure,
        );
        Self {
            config,
            authenticator,
            search,
            cookies,
            remote_identity,
        }
    }

    /// Wires every adapter the configuration enables. Features without keys are
    /// left out and the search falls back to demo results.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ApiError> {
        if config.uses_dev_secret() {
            warn!("SECRET_KEY is not set; using the development cookie secret.");
        }

        let http = create_client(config.http_timeout)?;

        // --- Authentication ---
        let (verifier, remote_identity): (Arc<dyn CredentialVerifier>, bool) =
            match &config.identity_api_key {
                Some(key) => {
                    info!("Identity provider configured; logins are verified remotely.");
                    (
                        Arc::new(FirebaseIdentityAdapter::new(
                            http.clone(),
                            config.identity_base_url.clone(),
                            key.clone(),
                        )),
                        true,
                    )
                }
                None => {
                    info!("No identity provider key; only the demo account can log in.");
                    (Arc::new(InMemoryCredentialVerifier::demo()?), false)
                }
            };
        let authenticator = Authenticator::new(
            verifier,
            Arc::new(InMemorySessionStore::new()),
            chrono::Duration::seconds(config.session_lifetime_secs),
        );

        // --- Search Backends ---
        let provider: Option<Arc<dyn ProductSearchProvider>> =
            config.serpapi_key.as_ref().map(|key| {
                info!("Search API configured.");
                Arc::new(SerpApiAdapter::new(
                    http.clone(),
                    config.serpapi_base_url.clone(),
                    key.clone(),
                    config.search_retry_backoff,
                )) as Arc<dyn ProductSearchProvider>
            });

        let scraper: Option<Arc<dyn RetailerScraper>> = config.scraper_enabled.then(|| {
            info!("Retailer scraper enabled.");
            Arc::new(EthicalScraper::new(http.clone(), ScrapeSite::defaults()))
                as Arc<dyn RetailerScraper>
        });

        let describer: Option<Arc<dyn ImageDescriber>> =
            config.openai_api_key.as_ref().map(|key| {
                info!("Vision model configured: {}", config.vision_model);
                let client = Client::with_config(OpenAIConfig::new().with_api_key(key));
                Arc::new(OpenAiVisionAdapter::new(
                    client,
                    config.vision_model.clone(),
                    config.vision_timeout,
                )) as Arc<dyn ImageDescriber>
            });

        if provider.is_none() && scraper.is_none() {
            info!("No live search backend configured; serving demo results.");
        }

        let search = PartsSearchService::new(
            SearchBackends {
                provider,
                scraper,
                describer,
            },
            ResultCache::new(config.cache_capacity, config.cache_ttl),
        );

        Ok(Self::new(config, authenticator, search, remote_identity))
    }
}
