//! crates/parts_finder_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like identity providers,
//! search APIs, retailer websites, or vision models.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::{Product, Session, UserIdentity};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., HTTP, parsing).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Feature not configured: {0}")]
    NotConfigured(String),
    #[error("Transient failure: {0}")]
    Transient(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Checks an email/password pair. Bad credentials are `PortError::Unauthorized`.
    async fn verify(&self, email: &str, password: &str) -> PortResult<UserIdentity>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: Session) -> PortResult<()>;

    async fn get(&self, session_id: Uuid) -> PortResult<Option<Session>>;

    /// Removes a session. Removing an unknown id is not an error.
    async fn remove(&self, session_id: Uuid) -> PortResult<()>;

    /// Drops every session whose `lifetime` has elapsed at `now`, returning how many went.
    async fn remove_expired(&self, now: DateTime<Utc>, lifetime: Duration) -> PortResult<usize>;
}

#[async_trait]
pub trait ProductSearchProvider: Send + Sync {
    /// Issues one outbound query and returns the raw listings, unfiltered.
    async fn search_products(&self, query: &str) -> PortResult<Vec<Product>>;
}

#[async_trait]
pub trait RetailerScraper: Send + Sync {
    /// Scrapes the configured retailer search pages for `query`.
    async fn scrape(&self, query: &str) -> PortResult<Vec<Product>>;
}

#[async_trait]
pub trait ImageDescriber: Send + Sync {
    /// Produces a short, search-ready description of the part in the image.
    async fn describe_image(&self, image: &[u8]) -> PortResult<String>;
}
