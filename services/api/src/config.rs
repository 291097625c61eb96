//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Every external service is optional: a
//! missing key disables that feature instead of failing startup.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// Cookie signing secret used when `SECRET_KEY` is unset. Fine for local demos only.
pub const DEV_SECRET_KEY: &str = "auto-parts-finder-dev-secret";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub secret_key: String,
    pub session_lifetime_secs: i64,
    pub cookie_secure: bool,
    pub max_upload_bytes: usize,
    pub cors_origin: Option<String>,
    pub identity_api_key: Option<String>,
    pub identity_base_url: String,
    pub serpapi_key: Option<String>,
    pub serpapi_base_url: String,
    pub search_retry_backoff: Duration,
    pub openai_api_key: Option<String>,
    pub vision_model: String,
    pub vision_timeout: Duration,
    pub scraper_enabled: bool,
    pub http_timeout: Duration,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, e.g. a map in tests.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        // --- Server and Session Settings ---
        let bind_address = parse_or(&var, "BIND_ADDRESS", "0.0.0.0:5000".parse().ok())?;

        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let secret_key = var("SECRET_KEY").unwrap_or_else(|| DEV_SECRET_KEY.to_string());
        let session_lifetime_secs: i64 = parse_or(
            &var,
            "SESSION_LIFETIME_SECS",
            Some(parts_finder_core::auth::DEFAULT_SESSION_LIFETIME_SECS),
        )?;
        let cookie_secure = parse_bool(&var, "COOKIE_SECURE", false)?;
        let max_upload_bytes = parse_or(&var, "MAX_UPLOAD_BYTES", Some(16 * 1024 * 1024))?;
        let cors_origin = var("CORS_ORIGIN");

        // --- External Services (all optional) ---
        let identity_api_key = var("FIREBASE_WEB_API_KEY");
        let identity_base_url = var("IDENTITY_BASE_URL")
            .unwrap_or_else(|| "https://identitytoolkit.googleapis.com/v1".to_string());

        let serpapi_key = var("SERPAPI_KEY");
        let serpapi_base_url =
            var("SERPAPI_BASE_URL").unwrap_or_else(|| "https://serpapi.com/search".to_string());
        let search_retry_backoff =
            Duration::from_millis(parse_or(&var, "SEARCH_RETRY_BACKOFF_MS", Some(2000))?);

        let openai_api_key = var("OPENAI_API_KEY");
        let vision_model = var("VISION_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let vision_timeout = Duration::from_secs(parse_or(&var, "VISION_TIMEOUT_SECS", Some(30))?);

        let scraper_enabled = parse_bool(&var, "SCRAPER_ENABLED", false)?;

        // --- Outbound HTTP and Cache Settings ---
        let http_timeout = Duration::from_secs(parse_or(&var, "HTTP_TIMEOUT_SECS", Some(8))?);
        let cache_capacity = parse_or(&var, "CACHE_CAPACITY", Some(100))?;
        let cache_ttl = Duration::from_secs(parse_or(&var, "CACHE_TTL_SECS", Some(300))?);

        Ok(Self {
            bind_address,
            log_level,
            secret_key,
            session_lifetime_secs,
            cookie_secure,
            max_upload_bytes,
            cors_origin,
            identity_api_key,
            identity_base_url,
            serpapi_key,
            serpapi_base_url,
            search_retry_backoff,
            openai_api_key,
            vision_model,
            vision_timeout,
            scraper_enabled,
            http_timeout,
            cache_capacity,
            cache_ttl,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: Option<T>) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingVar(key.to_string())),
    }
}

fn parse_bool<F>(var: &F, key: &str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("'{}' is not a boolean", v),
        )),
    }
}
