//! services/api/src/adapters/http.rs
//!
//! Shared outbound HTTP client used by every adapter that talks to the network.

use parts_finder_core::ports::PortError;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// User agent sent with every outbound request, including robots.txt checks.
pub const USER_AGENT: &str = concat!("AutoPartsFinder/", env!("CARGO_PKG_VERSION"));

/// Create a client with the short, client-wide timeout every outbound call shares.
pub fn create_client(timeout: Duration) -> Result<Client, PortError> {
    ClientBuilder::new()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .user_agent(USER_AGENT)
        .use_rustls_tls()
        .build()
        .map_err(|e| PortError::Unexpected(format!("Failed to create HTTP client: {}", e)))
}
