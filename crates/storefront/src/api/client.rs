//! Backend API client implementation.
//!
//! Uses `reqwest` for HTTP and caches product detail, featured lists and the
//! brand list using `moka`.

use std::sync::Arc;

use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use solarmart_core::{
    CalculatorEstimate, CalculatorInput, Category, Product, ProductId, Review, ReviewReceipt,
    ReviewSubmission,
};

use super::cache::{CacheKey, CacheValue};
use super::{ApiError, BearerToken};
use crate::catalog::ListingParams;
use crate::config::StorefrontConfig;

/// Maximum number of response body characters kept for diagnostics.
const BODY_SNIPPET_LEN: usize = 200;

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the SolarMart REST API.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    api_root: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                api_root: config.api_root(),
                cache,
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}{path}", self.inner.api_root))?)
    }

    /// Send a request and decode a JSON body, mapping error statuses.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        // Check for rate limiting
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Unauthorized);
        }

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(BODY_SNIPPET_LEN).collect(),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T, ApiError> {
        self.send(self.inner.client.get(url), resource).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
        credential: Option<&BearerToken>,
        resource: &str,
    ) -> Result<T, ApiError> {
        let mut request = self.inner.client.post(url).json(body);
        if let Some(token) = credential {
            request = request.bearer_auth(token.expose());
        }
        self.send(request, resource).await
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// List products matching the given backend-side filters.
    ///
    /// Never cached: every listing request reaches the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn list_products(&self, params: &ListingParams) -> Result<Vec<Product>, ApiError> {
        let mut url = self.endpoint("/products")?;
        {
            let pairs = params.to_query_pairs();
            if !pairs.is_empty() {
                url.query_pairs_mut().extend_pairs(pairs);
            }
        }

        let products: Vec<Product> = self.get_json(url, "products").await?;
        debug!(count = products.len(), "Fetched product listing");
        Ok(products)
    }

    /// Get the curated featured subset, optionally for one category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn featured_products(
        &self,
        category: Option<Category>,
        limit: u32,
    ) -> Result<Vec<Product>, ApiError> {
        let cache_key = CacheKey::Featured { category, limit };

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for featured products");
            return Ok(products);
        }

        let mut url = self.endpoint("/products/featured")?;
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(category) = category {
                pairs.append_pair("category", category.as_str());
            }
            pairs.append_pair("limit", &limit.to_string());
        }

        let products: Vec<Product> = self.get_json(url, "featured products").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a single product by ID.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown ID, or another error if
    /// the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("/products/{}", encode_segment(id.as_str())))?;
        let product: Product = self.get_json(url, &format!("product {id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop a cached product so the next read refetches it.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Get reviews for a product, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_reviews(&self, id: &ProductId) -> Result<Vec<Review>, ApiError> {
        let url = self.endpoint(&format!("/products/{}/reviews", encode_segment(id.as_str())))?;
        self.get_json(url, &format!("reviews for {id}")).await
    }

    /// Submit a review on behalf of the credential holder.
    ///
    /// The product's cached record is invalidated since its rating changes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the credential is rejected, or
    /// another error if the request fails.
    #[instrument(skip(self, credential, submission), fields(product_id = %submission.product_id))]
    pub async fn submit_review(
        &self,
        credential: &BearerToken,
        submission: &ReviewSubmission,
    ) -> Result<ReviewReceipt, ApiError> {
        let url = self.endpoint("/reviews")?;
        let receipt: ReviewReceipt = self
            .post_json(url, submission, Some(credential), "reviews")
            .await?;

        self.invalidate_product(&submission.product_id).await;
        Ok(receipt)
    }

    // =========================================================================
    // Calculator & brands
    // =========================================================================

    /// Ask the backend for a savings estimate.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self, input), fields(city = %input.city))]
    pub async fn calculate(&self, input: &CalculatorInput) -> Result<CalculatorEstimate, ApiError> {
        let url = self.endpoint("/calculator")?;
        self.post_json(url, input, None, "calculator").await
    }

    /// Get the distinct brand list used to populate the filter panel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response cannot be parsed.
    #[instrument(skip(self))]
    pub async fn brands(&self) -> Result<Vec<String>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.inner.cache.get(&CacheKey::Brands).await {
            debug!("Cache hit for brands");
            return Ok(brands);
        }

        let url = self.endpoint("/brands")?;
        let brands: Vec<String> = self.get_json(url, "brands").await?;

        self.inner
            .cache
            .insert(CacheKey::Brands, CacheValue::Brands(brands.clone()))
            .await;

        Ok(brands)
    }
}

/// Percent-encode an ID for use as a single path segment.
fn encode_segment(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_segment() {
        assert_eq!(encode_segment("5f1c-aa"), "5f1c-aa");
        assert_eq!(encode_segment("a/b c"), "a%2Fb%20c");
    }
}
