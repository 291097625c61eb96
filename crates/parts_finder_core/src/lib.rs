pub mod auth;
pub mod cache;
pub mod catalog;
pub mod domain;
pub mod ports;
pub mod query;
pub mod relevance;
pub mod search;

pub use auth::{Authenticator, LoginOutcome};
pub use cache::ResultCache;
pub use domain::{
    Availability, PartType, Product, SearchOutcome, SearchRequest, SearchSource, Session,
    UserIdentity, VehicleDescriptor,
};
pub use ports::{
    CredentialVerifier, ImageDescriber, PortError, PortResult, ProductSearchProvider,
    RetailerScraper, SessionStore,
};
pub use search::{PartsSearchService, SearchBackends};
