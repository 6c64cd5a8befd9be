//! Unified error handling with Sentry integration.
//!
//! [`StorefrontError`] is what every calling-surface helper returns. Each
//! variant maps to a user-facing [`Notice`] that never exposes internal
//! details, and optionally to a [`Route`] the caller should navigate to.

use core::fmt;

use sentry::types::Uuid;
use thiserror::Error;

use solarmart_core::{CalculatorFormError, ReviewDraftError};

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::StorageError;

/// Storefront-level error type.
#[derive(Debug, Error)]
pub enum StorefrontError {
    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Persisted session state could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Input was rejected before reaching the backend.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The action needs a signed-in shopper.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A product page could not be loaded for a reason other than 404.
    #[error("Product unavailable: {0}")]
    ProductUnavailable(#[source] ApiError),
}

impl From<ReviewDraftError> for StorefrontError {
    fn from(err: ReviewDraftError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CalculatorFormError> for StorefrontError {
    fn from(err: CalculatorFormError) -> Self {
        Self::Validation(err.to_string())
    }
}

// =============================================================================
// Notices & Routes
// =============================================================================

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A transient message for the shopper (a toast).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where the shopper should be sent after an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// The product listing.
    Shop,
    Login,
}

impl Route {
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Shop => "/shop",
            Self::Login => "/login",
        }
    }
}

impl StorefrontError {
    /// Whether this is a failure on our side or the backend's, as opposed to
    /// something the shopper can fix.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Config(_) => true,
            Self::Api(err) | Self::ProductUnavailable(err) => err.is_server_error(),
            Self::Validation(_) | Self::AuthenticationRequired | Self::NotFound(_) => false,
        }
    }

    /// User-facing notice. `fallback` is shown for failures whose details
    /// must stay internal, e.g. "Failed to submit review".
    #[must_use]
    pub fn notice(&self, fallback: &str) -> Notice {
        match self {
            Self::Validation(msg) => Notice::error(msg.clone()),
            Self::AuthenticationRequired | Self::Api(ApiError::Unauthorized) => {
                Notice::info("Please sign in to continue")
            }
            Self::NotFound(_) | Self::ProductUnavailable(_) | Self::Api(ApiError::NotFound(_)) => {
                Notice::error("Product not found")
            }
            Self::Api(ApiError::RateLimited(_)) => {
                Notice::error("Too many requests, please try again shortly")
            }
            Self::Api(_) | Self::Storage(_) | Self::Config(_) => Notice::error(fallback),
        }
    }

    /// Where to navigate, if anywhere.
    #[must_use]
    pub const fn route(&self) -> Option<Route> {
        match self {
            Self::AuthenticationRequired | Self::Api(ApiError::Unauthorized) => Some(Route::Login),
            Self::NotFound(_) | Self::ProductUnavailable(_) => Some(Route::Shop),
            _ => None,
        }
    }

    /// Capture server-class errors to Sentry and log them. Returns the
    /// Sentry event ID, or `None` if the error was not reported.
    pub fn report(&self) -> Option<Uuid> {
        self.is_server_error().then(|| capture(self))
    }

    /// [`report`](Self::report), then hand the error back for `?`.
    #[must_use]
    pub fn reported(self) -> Self {
        self.report();
        self
    }
}

/// Report a failed backend call that has no [`StorefrontError`] wrapper.
pub(crate) fn report_api_error(err: &ApiError) -> Option<Uuid> {
    err.is_server_error().then(|| capture(err))
}

fn capture<E: std::error::Error + ?Sized>(err: &E) -> Uuid {
    let event_id = sentry::capture_error(err);
    tracing::error!(
        error = %err,
        sentry_event_id = %event_id,
        "Storefront error"
    );
    event_id
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storefront_error_display() {
        let err = StorefrontError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = StorefrontError::from(ReviewDraftError::EmptyComment);
        assert_eq!(err.to_string(), "Validation error: Please write a review");
    }

    #[test]
    fn test_notice_hides_internal_details() {
        let err = StorefrontError::Api(ApiError::Status {
            status: 500,
            body: "stack trace at db.rs:42".to_string(),
        });
        let notice = err.notice("Calculation failed");
        assert_eq!(notice, Notice::error("Calculation failed"));
        assert!(err.is_server_error());
    }

    #[test]
    fn test_report_only_captures_server_errors() {
        let err = StorefrontError::ProductUnavailable(ApiError::Status {
            status: 502,
            body: String::new(),
        });
        assert!(err.report().is_some());

        assert!(StorefrontError::AuthenticationRequired.report().is_none());
        assert!(StorefrontError::Api(ApiError::NotFound("x".to_string())).report().is_none());
        assert!(report_api_error(&ApiError::Unauthorized).is_none());
        assert!(report_api_error(&ApiError::RateLimited(30)).is_some());
    }

    #[test]
    fn test_validation_notice_is_shown_verbatim() {
        let err = StorefrontError::from(CalculatorFormError::MissingRequired);
        assert_eq!(
            err.notice("Calculation failed").message,
            "Please fill all required fields"
        );
        assert!(!err.is_server_error());
        assert_eq!(err.route(), None);
    }

    #[test]
    fn test_auth_routes_to_login() {
        let err = StorefrontError::AuthenticationRequired;
        assert_eq!(err.route(), Some(Route::Login));
        assert_eq!(err.notice("x").level, NoticeLevel::Info);
        assert_eq!(Route::Login.path(), "/login");

        let err = StorefrontError::Api(ApiError::Unauthorized);
        assert_eq!(err.route(), Some(Route::Login));
        assert!(!err.is_server_error());
    }

    #[test]
    fn test_not_found_notice() {
        let err = StorefrontError::Api(ApiError::NotFound("product p9".to_string()));
        assert_eq!(err.notice("x").message, "Product not found");
        assert_eq!(err.route(), None);
    }

    #[test]
    fn test_product_page_errors_route_to_shop() {
        let err = StorefrontError::NotFound("p9".to_string());
        assert_eq!(err.route(), Some(Route::Shop));

        let err = StorefrontError::ProductUnavailable(ApiError::RateLimited(5));
        assert_eq!(err.route(), Some(Route::Shop));
        assert_eq!(err.notice("x").message, "Product not found");
        assert!(err.is_server_error());
        assert_eq!(Route::Shop.path(), "/shop");
    }
}
