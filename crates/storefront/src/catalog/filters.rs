//! Filter, sort and search criteria for the product listing.
//!
//! A [`FilterState`] serializes to two forms:
//! - [`ListingParams`]: the backend query for `GET /products`
//! - a shareable URL query string for deep links
//!
//! Both only emit a field when it differs from its default. The backend reads
//! an absent parameter as "no constraint", so a default value must never be
//! sent as an explicit bound.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use solarmart_core::{Category, Price};

/// Upper bound of the price slider, in rupees.
pub const DEFAULT_MAX_PRICE: i64 = 500_000;
/// Upper bound of the system-size slider, in kW.
pub const DEFAULT_MAX_SIZE_KW: f64 = 100.0;

// =============================================================================
// Sort Key
// =============================================================================

/// Ordering applied to the listing after it is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Backend order, untouched.
    #[default]
    Featured,
    PriceLow,
    PriceHigh,
    /// Highest rated first.
    Rating,
    SizeLow,
    SizeHigh,
}

impl SortKey {
    /// Every sort key, in the order offered to the user.
    pub const ALL: [Self; 6] = [
        Self::Featured,
        Self::PriceLow,
        Self::PriceHigh,
        Self::Rating,
        Self::SizeLow,
        Self::SizeHigh,
    ];

    /// Wire representation used in share links.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceLow => "price_low",
            Self::PriceHigh => "price_high",
            Self::Rating => "rating",
            Self::SizeLow => "size_low",
            Self::SizeHigh => "size_high",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("unknown sort key: {s}"))
    }
}

// =============================================================================
// Ranges
// =============================================================================

/// Inclusive price bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Price,
    pub max: Price,
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: Price::ZERO,
            max: Price::from_rupees(DEFAULT_MAX_PRICE),
        }
    }
}

impl PriceRange {
    fn min_narrowed(&self) -> bool {
        self.min > Price::ZERO
    }

    fn max_narrowed(&self) -> bool {
        self.max < Price::from_rupees(DEFAULT_MAX_PRICE)
    }

    /// Whether either bound differs from the slider default.
    #[must_use]
    pub fn is_narrowed(&self) -> bool {
        self.min_narrowed() || self.max_narrowed()
    }
}

/// Inclusive system-size bounds in kW.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeRange {
    pub min_kw: f64,
    pub max_kw: f64,
}

impl Default for SizeRange {
    fn default() -> Self {
        Self {
            min_kw: 0.0,
            max_kw: DEFAULT_MAX_SIZE_KW,
        }
    }
}

impl SizeRange {
    fn min_narrowed(&self) -> bool {
        self.min_kw > 0.0
    }

    fn max_narrowed(&self) -> bool {
        self.max_kw < DEFAULT_MAX_SIZE_KW
    }

    /// Whether either bound differs from the slider default.
    #[must_use]
    pub fn is_narrowed(&self) -> bool {
        self.min_narrowed() || self.max_narrowed()
    }
}

// =============================================================================
// Filter State
// =============================================================================

/// Everything the shopper has chosen on the listing page.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterState {
    /// `None` shows every category.
    pub category: Option<Category>,
    pub price: PriceRange,
    pub size: SizeRange,
    /// Selected brands, in selection order, without duplicates.
    pub brands: Vec<String>,
    /// Minimum star rating; 0 disables the threshold.
    pub min_rating: u8,
    pub in_stock_only: bool,
    /// Free-text search term; blank disables search.
    pub search: String,
    pub sort: SortKey,
}

impl FilterState {
    /// Select `brand` if unselected, otherwise deselect it.
    pub fn toggle_brand(&mut self, brand: &str) {
        if let Some(pos) = self.brands.iter().position(|b| b == brand) {
            self.brands.remove(pos);
        } else {
            self.brands.push(brand.to_owned());
        }
    }

    /// Number of filter dimensions currently away from their default.
    ///
    /// Counts category, price range, size range, brands, minimum rating and
    /// the in-stock flag. Search and sort are not filters.
    #[must_use]
    pub fn active_filter_count(&self) -> usize {
        [
            self.category.is_some(),
            self.price.is_narrowed(),
            self.size.is_narrowed(),
            !self.brands.is_empty(),
            self.min_rating > 0,
            self.in_stock_only,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    /// The trimmed search term, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        let term = self.search.trim();
        (!term.is_empty()).then_some(term)
    }

    /// Backend query for these criteria.
    ///
    /// The backend filters on a single brand. With exactly one brand selected
    /// it is forwarded; with several, none is sent and the brand set is
    /// applied client-side instead.
    #[must_use]
    pub fn listing_params(&self) -> ListingParams {
        ListingParams {
            category: self.category,
            min_price: self.price.min_narrowed().then_some(self.price.min),
            max_price: self.price.max_narrowed().then_some(self.price.max),
            min_size: self.size.min_narrowed().then_some(self.size.min_kw),
            max_size: self.size.max_narrowed().then_some(self.size.max_kw),
            brand: match self.brands.as_slice() {
                [only] => Some(only.clone()),
                _ => None,
            },
            in_stock: self.in_stock_only.then_some(true),
            limit: None,
        }
    }

    /// Render a shareable query string (no leading `?`), omitting defaults.
    #[must_use]
    pub fn to_share_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(category) = self.category {
            query.append_pair("category", category.as_str());
        }
        if self.price.min_narrowed() {
            query.append_pair("minPrice", &self.price.min.amount().to_string());
        }
        if self.price.max_narrowed() {
            query.append_pair("maxPrice", &self.price.max.amount().to_string());
        }
        if self.size.min_narrowed() {
            query.append_pair("minSize", &self.size.min_kw.to_string());
        }
        if self.size.max_narrowed() {
            query.append_pair("maxSize", &self.size.max_kw.to_string());
        }
        if !self.brands.is_empty() {
            query.append_pair("brands", &self.brands.join(","));
        }
        if self.min_rating > 0 {
            query.append_pair("minRating", &self.min_rating.to_string());
        }
        if self.in_stock_only {
            query.append_pair("inStock", "true");
        }
        if self.sort != SortKey::Featured {
            query.append_pair("sort", self.sort.as_str());
        }
        if let Some(term) = self.search_term() {
            query.append_pair("q", term);
        }
        query.finish()
    }

    /// Parse a shareable query string (with or without a leading `?`).
    ///
    /// Parsing is lenient: unknown keys are ignored and unparseable values
    /// fall back to their defaults.
    #[must_use]
    pub fn from_share_query(query: &str) -> Self {
        let mut state = Self::default();
        let query = query.strip_prefix('?').unwrap_or(query);

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let value = value.trim();
            match key.as_ref() {
                "category" => state.category = value.parse().ok(),
                "minPrice" => {
                    if let Some(min) = parse_price(value) {
                        state.price.min = min;
                    }
                }
                "maxPrice" => {
                    if let Some(max) = parse_price(value) {
                        state.price.max = max;
                    }
                }
                "minSize" => {
                    if let Some(min) = parse_kw(value) {
                        state.size.min_kw = min;
                    }
                }
                "maxSize" => {
                    if let Some(max) = parse_kw(value) {
                        state.size.max_kw = max;
                    }
                }
                "brands" => {
                    for brand in value.split(',').map(str::trim).filter(|b| !b.is_empty()) {
                        if !state.brands.iter().any(|b| b == brand) {
                            state.brands.push(brand.to_owned());
                        }
                    }
                }
                "minRating" => state.min_rating = value.parse::<u8>().map_or(0, |r| r.min(5)),
                "inStock" => state.in_stock_only = value == "true",
                "sort" => state.sort = value.parse().unwrap_or_default(),
                "q" => value.clone_into(&mut state.search),
                _ => {}
            }
        }

        state
    }
}

fn parse_price(raw: &str) -> Option<Price> {
    raw.parse::<Decimal>()
        .ok()
        .filter(|d| !d.is_sign_negative())
        .map(Price::new)
}

fn parse_kw(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

// =============================================================================
// Listing Params
// =============================================================================

/// Query parameters for `GET /products`.
///
/// `None` fields are omitted from the request entirely.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingParams {
    pub category: Option<Category>,
    pub min_price: Option<Price>,
    pub max_price: Option<Price>,
    pub min_size: Option<f64>,
    pub max_size: Option<f64>,
    pub brand: Option<String>,
    pub in_stock: Option<bool>,
    pub limit: Option<u32>,
}

impl ListingParams {
    /// Key/value pairs in wire order, skipping absent fields.
    #[must_use]
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(category) = self.category {
            pairs.push(("category", category.as_str().to_owned()));
        }
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.amount().to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.amount().to_string()));
        }
        if let Some(min) = self.min_size {
            pairs.push(("min_size", min.to_string()));
        }
        if let Some(max) = self.max_size {
            pairs.push(("max_size", max.to_string()));
        }
        if let Some(brand) = &self.brand {
            pairs.push(("brand", brand.clone()));
        }
        if let Some(in_stock) = self.in_stock {
            pairs.push(("in_stock", in_stock.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_emit_nothing() {
        let state = FilterState::default();
        assert_eq!(state.active_filter_count(), 0);
        assert!(state.listing_params().to_query_pairs().is_empty());
        assert_eq!(state.to_share_query(), "");
    }

    #[test]
    fn test_min_rating_counts_once() {
        let mut state = FilterState {
            min_rating: 4,
            ..FilterState::default()
        };
        assert_eq!(state.active_filter_count(), 1);

        state = FilterState::default();
        assert_eq!(state.active_filter_count(), 0);
    }

    #[test]
    fn test_every_dimension_counted() {
        let mut state = FilterState {
            category: Some(Category::Home),
            min_rating: 3,
            in_stock_only: true,
            ..FilterState::default()
        };
        state.price.max = Price::from_rupees(200_000);
        state.size.min_kw = 3.0;
        state.toggle_brand("SunTech");
        assert_eq!(state.active_filter_count(), 6);

        // Narrowing both ends of a range is still one dimension
        state.price.min = Price::from_rupees(50_000);
        assert_eq!(state.active_filter_count(), 6);
    }

    #[test]
    fn test_search_and_sort_not_counted() {
        let state = FilterState {
            search: "panel".to_string(),
            sort: SortKey::PriceHigh,
            ..FilterState::default()
        };
        assert_eq!(state.active_filter_count(), 0);
    }

    #[test]
    fn test_listing_params_only_non_defaults() {
        let mut state = FilterState {
            category: Some(Category::Commercial),
            in_stock_only: true,
            ..FilterState::default()
        };
        state.price.min = Price::from_rupees(10_000);
        state.size.max_kw = 25.0;

        let pairs = state.listing_params().to_query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("category", "commercial".to_string()),
                ("min_price", "10000".to_string()),
                ("max_size", "25".to_string()),
                ("in_stock", "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_single_brand_forwarded_multiple_withheld() {
        let mut state = FilterState::default();
        state.toggle_brand("SunTech");
        assert_eq!(state.listing_params().brand.as_deref(), Some("SunTech"));

        state.toggle_brand("Luminous");
        assert_eq!(state.listing_params().brand, None);

        state.toggle_brand("SunTech");
        assert_eq!(state.listing_params().brand.as_deref(), Some("Luminous"));
    }

    #[test]
    fn test_toggle_brand_twice_is_noop() {
        let mut state = FilterState::default();
        state.toggle_brand("Tata Power");
        state.toggle_brand("Tata Power");
        assert!(state.brands.is_empty());
    }

    #[test]
    fn test_share_query_round_trip() {
        let mut state = FilterState {
            category: Some(Category::Home),
            min_rating: 4,
            in_stock_only: true,
            search: "mono perc".to_string(),
            sort: SortKey::SizeHigh,
            ..FilterState::default()
        };
        state.price.max = Price::from_rupees(300_000);
        state.size.min_kw = 2.5;
        state.toggle_brand("SunTech");
        state.toggle_brand("Adani Solar");

        let query = state.to_share_query();
        assert!(query.contains("brands=SunTech%2CAdani+Solar"));
        assert!(!query.contains("minPrice"));

        let parsed = FilterState::from_share_query(&format!("?{query}"));
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_share_query_lenient() {
        let parsed = FilterState::from_share_query(
            "category=industrial&minPrice=abc&maxSize=-4&minRating=9&sort=cheapest&inStock=yes&utm=x",
        );
        assert_eq!(parsed.category, None);
        assert_eq!(parsed.price, PriceRange::default());
        assert_eq!(parsed.size, SizeRange::default());
        assert_eq!(parsed.min_rating, 5);
        assert_eq!(parsed.sort, SortKey::Featured);
        assert!(!parsed.in_stock_only);
    }

    #[test]
    fn test_sort_key_parse() {
        for key in SortKey::ALL {
            assert_eq!(key.as_str().parse::<SortKey>().unwrap(), key);
        }
        assert!("newest".parse::<SortKey>().is_err());
    }
}
