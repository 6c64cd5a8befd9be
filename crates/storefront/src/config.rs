//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SOLARMART_API_BASE_URL` - Backend origin (e.g., `https://shop.example.com`);
//!   the REST API lives under `<base>/api`
//!
//! ## Optional
//! - `SOLARMART_SESSION_DIR` - Directory for persisted cart/wishlist/compare state
//!   (default: in-memory only)
//! - `SOLARMART_CACHE_TTL_SECS` - Product/brand cache lifetime (default: 300)
//! - `SOLARMART_REQUEST_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront session configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend origin; the REST API is mounted at `<api_base_url>/api`
    pub api_base_url: Url,
    /// Where persisted session state is written, if anywhere
    pub session_dir: Option<PathBuf>,
    /// Lifetime of cached product detail, featured lists and brands
    pub cache_ttl: Duration,
    /// Per-request timeout for backend calls
    pub request_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_base = lookup("SOLARMART_API_BASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("SOLARMART_API_BASE_URL".to_string()))?;
        let api_base_url = Url::parse(&raw_base).map_err(|e| {
            ConfigError::InvalidEnvVar("SOLARMART_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SOLARMART_API_BASE_URL".to_string(),
                format!("unsupported scheme '{}'", api_base_url.scheme()),
            ));
        }

        let session_dir = lookup("SOLARMART_SESSION_DIR")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let cache_ttl = parse_secs(&lookup, "SOLARMART_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        let request_timeout = parse_secs(
            &lookup,
            "SOLARMART_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            api_base_url,
            session_dir,
            cache_ttl,
            request_timeout,
            sentry_dsn: lookup("SENTRY_DSN"),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_base_url` with every optional setting at
    /// its default.
    #[must_use]
    pub const fn with_base_url(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            session_dir: None,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Root of the REST API (`<base>/api`), without a trailing slash.
    #[must_use]
    pub fn api_root(&self) -> String {
        format!("{}/api", self.api_base_url.as_str().trim_end_matches('/'))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse an optional whole-seconds duration, falling back to `default`.
fn parse_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, ConfigError> {
    lookup(key).map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
