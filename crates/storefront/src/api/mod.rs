//! REST client for the SolarMart backend.
//!
//! # Architecture
//!
//! - Plain JSON over HTTP with `reqwest`; the backend is the source of truth
//! - In-memory caching via `moka` for product detail, featured lists and the
//!   brand list (TTL from configuration). Listings are never cached so that
//!   every criteria change observes fresh results.
//!
//! # Endpoints
//!
//! | Method | Path | Client method |
//! |---|---|---|
//! | GET | `/products` | [`ApiClient::list_products`] |
//! | GET | `/products/featured` | [`ApiClient::featured_products`] |
//! | GET | `/products/{id}` | [`ApiClient::get_product`] |
//! | GET | `/products/{id}/reviews` | [`ApiClient::get_reviews`] |
//! | POST | `/reviews` | [`ApiClient::submit_review`] |
//! | POST | `/calculator` | [`ApiClient::calculate`] |
//! | GET | `/brands` | [`ApiClient::brands`] |
//!
//! # Example
//!
//! ```rust,ignore
//! use solarmart_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config)?;
//! let product = client.get_product(&ProductId::new("5f1c")).await?;
//! let reviews = client.get_reviews(&product.id).await?;
//! ```

mod cache;
mod client;

pub use client::ApiClient;

use core::fmt;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, timeout, body decoding).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The bearer credential was missing, expired or rejected.
    #[error("Unauthorized")]
    Unauthorized,

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Any other non-success status.
    #[error("Unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        body: String,
    },
}

impl ApiError {
    /// Whether the failure was a 404 for the requested resource.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Whether the failure is worth reporting: anything but a missing
    /// resource or a rejected credential.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::Unauthorized)
    }
}

/// Opaque session credential issued by the authentication service.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct BearerToken(SecretString);

impl BearerToken {
    /// Wrap a raw access token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken([REDACTED])")
    }
}
