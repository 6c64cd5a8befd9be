//! Catalog query: listing criteria, request issuing and response application.
//!
//! # Request lifecycle
//!
//! Every change to the criteria (filters, sort, search, route category)
//! returns exactly one [`ListingRequest`], tagged with a [`RequestTicket`]
//! drawn from a monotonically increasing sequence. Requests may be in flight
//! concurrently and complete in any order; [`CatalogQuery::apply`] accepts a
//! response only if its ticket is the most recently issued one, and discards
//! anything older.
//!
//! ```rust,ignore
//! let request = query.update(|f| f.min_rating = 4);
//! let result = client.list_products(&request.params).await;
//! query.apply(request.ticket, result);
//! ```
//!
//! [`Catalog`] packages that loop for callers that share one query between
//! tasks.

mod filters;
mod pipeline;

pub use filters::{
    DEFAULT_MAX_PRICE, DEFAULT_MAX_SIZE_KW, FilterState, ListingParams, PriceRange, SizeRange,
    SortKey,
};
pub use pipeline::{matches_search, post_process, sort_products};

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, instrument};

use solarmart_core::{Category, Product};

use crate::api::{ApiClient, ApiError};
use crate::error::report_api_error;

// =============================================================================
// Tickets & Requests
// =============================================================================

/// Sequence number identifying one issued listing request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

/// A listing request to send to `GET /products`.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRequest {
    pub ticket: RequestTicket,
    pub params: ListingParams,
}

/// Where the visible listing currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingStatus {
    /// No request issued yet.
    #[default]
    Idle,
    /// The latest request has not completed.
    Loading,
    /// The latest request succeeded.
    Ready,
    /// The latest request failed; the visible list is empty.
    Failed,
}

/// Result of offering a response to [`CatalogQuery::apply`].
#[derive(Debug)]
pub enum ApplyOutcome {
    /// The response was current and is now displayed.
    Applied {
        /// Products visible after post-processing.
        shown: usize,
    },
    /// The response was current but the request failed; the list is empty.
    Failed(ApiError),
    /// A newer request was issued after this one; the response was ignored.
    Stale,
}

impl ApplyOutcome {
    /// Whether the response was discarded as superseded.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale)
    }
}

// =============================================================================
// CatalogQuery
// =============================================================================

/// Owns the listing criteria and the visible product list.
#[derive(Debug, Default)]
pub struct CatalogQuery {
    filters: FilterState,
    last_issued: u64,
    products: Vec<Product>,
    status: ListingStatus,
}

impl CatalogQuery {
    /// A query at default criteria with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A query seeded from existing criteria (e.g. a share link).
    #[must_use]
    pub fn with_filters(filters: FilterState) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    /// Current criteria.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Products from the latest applied response, post-processed.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn status(&self) -> ListingStatus {
        self.status
    }

    /// Filter badge count, recomputed from the current criteria.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        self.filters.active_filter_count()
    }

    /// The most recently issued ticket, if any.
    #[must_use]
    pub const fn latest_ticket(&self) -> Option<RequestTicket> {
        if self.last_issued == 0 {
            None
        } else {
            Some(RequestTicket(self.last_issued))
        }
    }

    /// Issue a request for the current criteria without changing them.
    pub fn refresh(&mut self) -> ListingRequest {
        self.last_issued += 1;
        self.status = ListingStatus::Loading;
        ListingRequest {
            ticket: RequestTicket(self.last_issued),
            params: self.filters.listing_params(),
        }
    }

    /// Apply an arbitrary edit to the criteria as one change.
    pub fn update(&mut self, edit: impl FnOnce(&mut FilterState)) -> ListingRequest {
        edit(&mut self.filters);
        self.refresh()
    }

    pub fn set_sort(&mut self, sort: SortKey) -> ListingRequest {
        self.update(|f| f.sort = sort)
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> ListingRequest {
        let search = search.into();
        self.update(|f| f.search = search)
    }

    pub fn toggle_brand(&mut self, brand: &str) -> ListingRequest {
        self.update(|f| f.toggle_brand(brand))
    }

    /// Follow a category taken from the route (e.g. `/shop/home`).
    pub fn set_route_category(&mut self, category: Option<Category>) -> ListingRequest {
        self.update(|f| f.category = category)
    }

    /// Reset every filter dimension to its default in a single change.
    ///
    /// Sort order and search text are kept.
    pub fn clear_filters(&mut self) -> ListingRequest {
        self.update(|f| {
            *f = FilterState {
                sort: f.sort,
                search: core::mem::take(&mut f.search),
                ..FilterState::default()
            };
        })
    }

    /// Offer the response for `ticket`. Only the latest ticket is applied.
    pub fn apply(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<Product>, ApiError>,
    ) -> ApplyOutcome {
        if ticket.0 != self.last_issued {
            debug!(
                ticket = ticket.0,
                latest = self.last_issued,
                "Discarding stale listing response"
            );
            return ApplyOutcome::Stale;
        }

        match result {
            Ok(products) => {
                self.products = post_process(products, &self.filters);
                self.status = ListingStatus::Ready;
                ApplyOutcome::Applied {
                    shown: self.products.len(),
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Listing request failed");
                self.products.clear();
                self.status = ListingStatus::Failed;
                ApplyOutcome::Failed(e)
            }
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Read-only copy of the listing for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub filters: FilterState,
    pub products: Vec<Product>,
    pub status: ListingStatus,
    pub active_filter_count: usize,
    pub share_query: String,
}

/// A [`CatalogQuery`] shared between tasks, wired to the backend.
///
/// The lock is only held to mutate criteria or apply a response, never across
/// the network call, so overlapping changes each issue their own request.
#[derive(Clone)]
pub struct Catalog {
    client: ApiClient,
    query: Arc<Mutex<CatalogQuery>>,
}

impl Catalog {
    /// Create a catalog over `query`.
    #[must_use]
    pub fn new(client: ApiClient, query: CatalogQuery) -> Self {
        Self {
            client,
            query: Arc::new(Mutex::new(query)),
        }
    }

    /// Apply a criteria change, fetch, and apply the response if still current.
    #[instrument(skip_all)]
    pub async fn change(
        &self,
        change: impl FnOnce(&mut CatalogQuery) -> ListingRequest,
    ) -> ApplyOutcome {
        let request = {
            let mut query = self.query.lock().unwrap_or_else(PoisonError::into_inner);
            change(&mut query)
        };

        let result = self.client.list_products(&request.params).await;

        let outcome = self
            .query
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .apply(request.ticket, result);
        if let ApplyOutcome::Failed(err) = &outcome {
            report_api_error(err);
        }
        outcome
    }

    /// Fetch the listing for the current criteria.
    pub async fn refresh(&self) -> ApplyOutcome {
        self.change(CatalogQuery::refresh).await
    }

    /// Copy of the current listing state.
    #[must_use]
    pub fn snapshot(&self) -> CatalogSnapshot {
        let query = self.query.lock().unwrap_or_else(PoisonError::into_inner);
        CatalogSnapshot {
            filters: query.filters.clone(),
            products: query.products.clone(),
            status: query.status,
            active_filter_count: query.active_filter_count(),
            share_query: query.filters.to_share_query(),
        }
    }
}

#[cfg(test)]
mod tests {
    use solarmart_core::{Price, ProductId};

    use super::*;

    fn product(id: &str, price: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Kit {id}"),
            category: Category::Home,
            brand: "SunTech".to_string(),
            price: Price::from_rupees(price),
            original_price: None,
            system_size_kw: 3.0,
            efficiency_rating: 21.0,
            rating: Some(4.0),
            review_count: Some(3),
            image_url: String::new(),
            description: String::new(),
            features: Vec::new(),
            vendor_name: String::new(),
            warranty_years: 25,
            in_stock: true,
        }
    }

    fn names(query: &CatalogQuery) -> Vec<&str> {
        query.products().iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_each_change_issues_one_increasing_ticket() {
        let mut query = CatalogQuery::new();
        assert_eq!(query.latest_ticket(), None);
        assert_eq!(query.status(), ListingStatus::Idle);

        let first = query.set_sort(SortKey::PriceLow);
        let second = query.update(|f| f.in_stock_only = true);
        let third = query.clear_filters();

        assert!(first.ticket < second.ticket);
        assert!(second.ticket < third.ticket);
        assert_eq!(query.latest_ticket(), Some(third.ticket));
        assert_eq!(query.status(), ListingStatus::Loading);
    }

    #[test]
    fn test_request_params_follow_criteria() {
        let mut query = CatalogQuery::new();
        let request = query.set_route_category(Some(Category::Commercial));
        assert_eq!(request.params.category, Some(Category::Commercial));

        let request = query.update(|f| f.min_rating = 4);
        // Minimum rating is applied client-side only
        assert_eq!(request.params.category, Some(Category::Commercial));
        assert_eq!(request.params.to_query_pairs().len(), 1);
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut query = CatalogQuery::new();
        let first = query.update(|f| f.category = Some(Category::Home));
        let second = query.update(|f| f.in_stock_only = true);

        // Second resolves first
        let outcome = query.apply(second.ticket, Ok(vec![product("fresh", 100)]));
        assert!(matches!(outcome, ApplyOutcome::Applied { shown: 1 }));

        // First resolves last and must not overwrite
        let outcome = query.apply(first.ticket, Ok(vec![product("stale", 200)]));
        assert!(outcome.is_stale());
        assert_eq!(names(&query), ["fresh"]);
        assert_eq!(query.status(), ListingStatus::Ready);
    }

    #[test]
    fn test_stale_failure_does_not_clear_results() {
        let mut query = CatalogQuery::new();
        let first = query.refresh();
        let second = query.refresh();

        query.apply(second.ticket, Ok(vec![product("kept", 100)]));
        let outcome = query.apply(first.ticket, Err(ApiError::NotFound("products".into())));
        assert!(outcome.is_stale());
        assert_eq!(names(&query), ["kept"]);
    }

    #[test]
    fn test_failure_falls_back_to_empty() {
        let mut query = CatalogQuery::new();
        let request = query.refresh();
        query.apply(request.ticket, Ok(vec![product("a", 1)]));

        let request = query.refresh();
        let outcome = query.apply(
            request.ticket,
            Err(ApiError::Status {
                status: 500,
                body: String::new(),
            }),
        );
        assert!(matches!(outcome, ApplyOutcome::Failed(_)));
        assert!(query.products().is_empty());
        assert_eq!(query.status(), ListingStatus::Failed);
    }

    #[test]
    fn test_apply_post_processes() {
        let mut query = CatalogQuery::new();
        let request = query.set_sort(SortKey::PriceHigh);
        query.apply(
            request.ticket,
            Ok(vec![product("cheap", 100), product("dear", 900)]),
        );
        assert_eq!(names(&query), ["dear", "cheap"]);
    }

    #[test]
    fn test_clear_filters_resets_count_atomically() {
        let mut query = CatalogQuery::new();
        query.update(|f| f.min_rating = 4);
        assert_eq!(query.active_filter_count(), 1);

        query.update(|f| {
            f.category = Some(Category::Home);
            f.in_stock_only = true;
            f.search = "perc".to_string();
            f.sort = SortKey::Rating;
        });
        assert_eq!(query.active_filter_count(), 3);

        let before = query.latest_ticket();
        let request = query.clear_filters();
        assert_eq!(query.active_filter_count(), 0);
        assert_eq!(Some(request.ticket), query.latest_ticket());
        assert_ne!(before, query.latest_ticket());
        assert!(request.params.to_query_pairs().is_empty());
        assert_eq!(query.filters().sort, SortKey::Rating);
        assert_eq!(query.filters().search, "perc");
    }
}
