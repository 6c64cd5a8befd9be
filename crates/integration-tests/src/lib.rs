//! Integration test support for the SolarMart storefront SDK.
//!
//! [`MockBackend`] serves the SolarMart REST API from memory on an ephemeral
//! local port. Tests point a [`StorefrontConfig`] at it and drive the SDK
//! end to end.
//!
//! ```rust,ignore
//! let backend = MockBackend::start(sample_products()).await;
//! let client = ApiClient::new(&backend.config())?;
//! backend.set_listing_delay(Some(Category::Home), Duration::from_millis(300));
//! ```

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use tokio::task::JoinHandle;
use url::Url;

use solarmart_core::{
    CalculatorEstimate, CalculatorInput, Category, Price, Product, ProductId, Review, ReviewId,
    ReviewReceipt, ReviewSubmission,
};
use solarmart_storefront::StorefrontConfig;

/// The only bearer token the mock accepts for `POST /reviews`.
pub const VALID_TOKEN: &str = "test-session-token";

/// One request seen by the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Default)]
struct MockState {
    products: Mutex<Vec<Product>>,
    reviews: Mutex<HashMap<ProductId, Vec<Review>>>,
    /// Listing delay keyed by the `category` parameter (`None` = no category).
    listing_delays: Mutex<HashMap<Option<String>, Duration>>,
    failing: Mutex<HashSet<ProductId>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockState {
    fn record(&self, path: impl Into<String>, query: HashMap<String, String>) {
        lock(&self.requests).push(RecordedRequest {
            path: path.into(),
            query,
        });
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory SolarMart backend bound to `127.0.0.1`.
///
/// The server task is aborted when the value is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockBackend {
    /// Start serving `products`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::unwrap_used)]
    pub async fn start(products: Vec<Product>) -> Self {
        let state = Arc::new(MockState::default());
        *lock(&state.products) = products;

        let app = Router::new()
            .route("/api/products", get(list_products))
            .route("/api/products/featured", get(featured_products))
            .route("/api/products/{id}", get(get_product))
            .route("/api/products/{id}/reviews", get(get_reviews))
            .route("/api/reviews", post(create_review))
            .route("/api/calculator", post(calculate))
            .route("/api/brands", get(brands))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL without the `/api` suffix.
    ///
    /// # Panics
    ///
    /// Never in practice; the address always forms a valid URL.
    #[allow(clippy::unwrap_used)]
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}", self.addr)).unwrap()
    }

    /// A configuration pointed at this backend with short timeouts.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        let mut config = StorefrontConfig::with_base_url(self.base_url());
        config.request_timeout = Duration::from_secs(5);
        config
    }

    /// Delay listing responses for one `category` parameter value.
    pub fn set_listing_delay(&self, category: Option<Category>, delay: Duration) {
        lock(&self.state.listing_delays).insert(category.map(|c| c.as_str().to_owned()), delay);
    }

    /// Make `GET /products/{id}` answer 500 for this ID.
    pub fn fail_product(&self, id: &ProductId) {
        lock(&self.state.failing).insert(id.clone());
    }

    /// Remove a product so lookups answer 404.
    pub fn remove_product(&self, id: &ProductId) {
        lock(&self.state.products).retain(|p| p.id != *id);
    }

    pub fn add_review(&self, review: Review) {
        lock(&self.state.reviews)
            .entry(review.product_id.clone())
            .or_default()
            .insert(0, review);
    }

    /// Every request received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state.requests).clone()
    }

    /// Number of requests received for `path` (e.g. `/api/products`).
    #[must_use]
    pub fn request_count(&self, path: &str) -> usize {
        lock(&self.state.requests)
            .iter()
            .filter(|r| r.path == path)
            .count()
    }
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

type SharedState = State<Arc<MockState>>;

async fn list_products(
    State(state): SharedState,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Vec<Product>> {
    state.record("/api/products", query.clone());

    let delay = lock(&state.listing_delays)
        .get(&query.get("category").cloned())
        .copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let products = lock(&state.products).clone();
    let mut matched: Vec<Product> = products
        .into_iter()
        .filter(|p| matches_listing_query(p, &query))
        .collect();
    if let Some(limit) = query.get("limit").and_then(|l| l.parse::<usize>().ok()) {
        matched.truncate(limit);
    }
    Json(matched)
}

fn matches_listing_query(product: &Product, query: &HashMap<String, String>) -> bool {
    let price = |key: &str| query.get(key).and_then(|v| v.parse::<Decimal>().ok());
    let size = |key: &str| query.get(key).and_then(|v| v.parse::<f64>().ok());

    query
        .get("category")
        .is_none_or(|c| product.category.as_str() == c)
        && price("min_price").is_none_or(|min| product.price.amount() >= min)
        && price("max_price").is_none_or(|max| product.price.amount() <= max)
        && size("min_size").is_none_or(|min| product.system_size_kw >= min)
        && size("max_size").is_none_or(|max| product.system_size_kw <= max)
        && query.get("brand").is_none_or(|b| product.brand == *b)
        && query
            .get("in_stock")
            .is_none_or(|v| v != "true" || product.in_stock)
}

#[derive(Deserialize)]
struct FeaturedQuery {
    category: Option<Category>,
    limit: Option<usize>,
}

async fn featured_products(
    State(state): SharedState,
    Query(query): Query<FeaturedQuery>,
) -> Json<Vec<Product>> {
    state.record("/api/products/featured", HashMap::new());
    let featured = lock(&state.products)
        .iter()
        .filter(|p| query.category.is_none_or(|c| p.category == c))
        .take(query.limit.unwrap_or(8))
        .cloned()
        .collect();
    Json(featured)
}

async fn get_product(State(state): SharedState, Path(id): Path<String>) -> Response {
    state.record(format!("/api/products/{id}"), HashMap::new());
    let id = ProductId::new(id);

    if lock(&state.failing).contains(&id) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response();
    }

    let product = lock(&state.products).iter().find(|p| p.id == id).cloned();
    match product {
        Some(product) => Json(product).into_response(),
        None => (StatusCode::NOT_FOUND, "Product not found").into_response(),
    }
}

async fn get_reviews(State(state): SharedState, Path(id): Path<String>) -> Json<Vec<Review>> {
    state.record(format!("/api/products/{id}/reviews"), HashMap::new());
    let reviews = lock(&state.reviews)
        .get(&ProductId::new(id))
        .cloned()
        .unwrap_or_default();
    Json(reviews)
}

async fn create_review(
    State(state): SharedState,
    headers: HeaderMap,
    Json(submission): Json<ReviewSubmission>,
) -> Response {
    state.record("/api/reviews", HashMap::new());

    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {VALID_TOKEN}"));
    if !authorized {
        return (StatusCode::UNAUTHORIZED, "Not authenticated").into_response();
    }

    let id = ReviewId::new(format!("r-{}", lock(&state.requests).len()));
    let review = Review {
        id: id.clone(),
        product_id: submission.product_id.clone(),
        user_name: "Test Shopper".to_string(),
        rating: submission.rating,
        comment: submission.comment,
        created_at: Utc::now(),
    };
    lock(&state.reviews)
        .entry(submission.product_id)
        .or_default()
        .insert(0, review);

    Json(ReviewReceipt {
        message: "Review submitted".to_string(),
        id,
    })
    .into_response()
}

async fn calculate(
    State(state): SharedState,
    Json(input): Json<CalculatorInput>,
) -> Json<CalculatorEstimate> {
    state.record("/api/calculator", HashMap::new());

    let size = (input.monthly_bill / 1000.0).ceil();
    let cost = size * 60_000.0;
    let savings = input.monthly_bill * 10.0;
    Json(CalculatorEstimate {
        recommended_size_kw: size,
        estimated_cost: cost,
        annual_savings: savings,
        payback_years: cost / savings,
        co2_reduction_kg: size * 1_200.0,
    })
}

async fn brands(State(state): SharedState) -> Json<Vec<String>> {
    state.record("/api/brands", HashMap::new());
    let mut brands: Vec<String> = lock(&state.products)
        .iter()
        .map(|p| p.brand.clone())
        .collect();
    brands.sort();
    brands.dedup();
    Json(brands)
}

// =============================================================================
// Fixtures
// =============================================================================

/// A product with sensible defaults.
#[must_use]
pub fn product(id: &str, category: Category, brand: &str, price: i64, size_kw: f64) -> Product {
    Product {
        id: ProductId::new(id),
        name: format!("{brand} {size_kw}kW Kit"),
        category,
        brand: brand.to_string(),
        price: Price::from_rupees(price),
        original_price: None,
        system_size_kw: size_kw,
        efficiency_rating: 20.5,
        rating: Some(4.2),
        review_count: Some(10),
        image_url: format!("https://img.example.com/{id}.jpg"),
        description: format!("Grid-tied {size_kw}kW rooftop system"),
        features: vec!["25-year warranty".to_string()],
        vendor_name: "SolarMart Partner".to_string(),
        warranty_years: 25,
        in_stock: true,
    }
}

/// A small mixed catalog of home and commercial kits.
#[must_use]
pub fn sample_products() -> Vec<Product> {
    let mut out_of_stock = product("h3", Category::Home, "Luminous", 95_000, 2.0);
    out_of_stock.in_stock = false;
    out_of_stock.rating = None;

    vec![
        product("h1", Category::Home, "SunTech", 150_000, 3.0),
        product("h2", Category::Home, "Tata Power", 240_000, 5.0),
        out_of_stock,
        product("c1", Category::Commercial, "Adani Solar", 1_200_000, 50.0),
        product("c2", Category::Commercial, "SunTech", 450_000, 20.0),
    ]
}
