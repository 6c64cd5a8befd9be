//! Client-side post-processing of a backend listing.
//!
//! Applied in a fixed order: sort, then search, then the residual filters the
//! backend cannot express. Every step preserves the relative order of the
//! products it keeps, so equal sort keys stay in backend order.

use core::cmp::Ordering;

use solarmart_core::Product;

use super::filters::{FilterState, SortKey};

/// Run the full pipeline over a fresh backend response.
#[must_use]
pub fn post_process(mut products: Vec<Product>, filters: &FilterState) -> Vec<Product> {
    sort_products(&mut products, filters.sort);

    if let Some(term) = filters.search_term() {
        let needle = term.to_lowercase();
        products.retain(|p| matches_search(p, &needle));
    }

    products.retain(|p| passes_residual_filters(p, filters));
    products
}

/// Stable sort by the given key. `Featured` keeps backend order.
pub fn sort_products(products: &mut [Product], key: SortKey) {
    let compare: fn(&Product, &Product) -> Ordering = match key {
        SortKey::Featured => return,
        SortKey::PriceLow => |a: &Product, b: &Product| a.price.cmp(&b.price),
        SortKey::PriceHigh => |a: &Product, b: &Product| b.price.cmp(&a.price),
        SortKey::Rating => |a: &Product, b: &Product| {
            b.rating_or_zero().total_cmp(&a.rating_or_zero())
        },
        SortKey::SizeLow => |a: &Product, b: &Product| {
            a.system_size_kw.total_cmp(&b.system_size_kw)
        },
        SortKey::SizeHigh => |a: &Product, b: &Product| {
            b.system_size_kw.total_cmp(&a.system_size_kw)
        },
    };
    // `sort_by` is a stable merge sort
    products.sort_by(compare);
}

/// Case-insensitive substring match on name, description or brand.
///
/// `needle` must already be lowercase. Empty fields never match.
#[must_use]
pub fn matches_search(product: &Product, needle: &str) -> bool {
    [&product.name, &product.description, &product.brand]
        .into_iter()
        .filter(|field| !field.is_empty())
        .any(|field| field.to_lowercase().contains(needle))
}

/// Minimum rating and multi-brand selection, neither of which reaches the
/// backend.
fn passes_residual_filters(product: &Product, filters: &FilterState) -> bool {
    if filters.min_rating > 0 && product.rating_or_zero() < f64::from(filters.min_rating) {
        return false;
    }
    if filters.brands.len() > 1 && !filters.brands.iter().any(|b| *b == product.brand) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use solarmart_core::{Category, Price, ProductId};

    use super::*;

    fn product(id: &str, price: i64, size: f64, rating: Option<f64>) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Panel {id}"),
            category: Category::Home,
            brand: "Generic".to_string(),
            price: Price::from_rupees(price),
            original_price: None,
            system_size_kw: size,
            efficiency_rating: 20.0,
            rating,
            review_count: None,
            image_url: String::new(),
            description: String::new(),
            features: Vec::new(),
            vendor_name: String::new(),
            warranty_years: 25,
            in_stock: true,
        }
    }

    fn ids(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_featured_keeps_backend_order() {
        let mut products = vec![
            product("c", 300, 3.0, None),
            product("a", 100, 1.0, None),
            product("b", 200, 2.0, None),
        ];
        sort_products(&mut products, SortKey::Featured);
        assert_eq!(ids(&products), ["c", "a", "b"]);
    }

    #[test]
    fn test_price_low_is_stable() {
        let mut products = vec![
            product("x", 500, 1.0, None),
            product("first", 100, 1.0, None),
            product("second", 100, 2.0, None),
            product("third", 100, 3.0, None),
        ];
        sort_products(&mut products, SortKey::PriceLow);
        assert_eq!(ids(&products), ["first", "second", "third", "x"]);
    }

    #[test]
    fn test_price_high_is_stable() {
        let mut products = vec![
            product("low", 100, 1.0, None),
            product("tie-1", 900, 1.0, None),
            product("tie-2", 900, 1.0, None),
        ];
        sort_products(&mut products, SortKey::PriceHigh);
        assert_eq!(ids(&products), ["tie-1", "tie-2", "low"]);
    }

    #[test]
    fn test_rating_treats_missing_as_zero() {
        let mut products = vec![
            product("unrated", 100, 1.0, None),
            product("good", 100, 1.0, Some(4.2)),
            product("best", 100, 1.0, Some(4.9)),
            product("poor", 100, 1.0, Some(0.5)),
        ];
        sort_products(&mut products, SortKey::Rating);
        assert_eq!(ids(&products), ["best", "good", "poor", "unrated"]);
    }

    #[test]
    fn test_size_sorts() {
        let mut products = vec![
            product("mid", 100, 5.0, None),
            product("big", 100, 50.0, None),
            product("small", 100, 1.5, None),
        ];
        sort_products(&mut products, SortKey::SizeLow);
        assert_eq!(ids(&products), ["small", "mid", "big"]);
        sort_products(&mut products, SortKey::SizeHigh);
        assert_eq!(ids(&products), ["big", "mid", "small"]);
    }

    #[test]
    fn test_search_matches_brand_case_insensitively() {
        let mut p = product("eco", 100, 5.0, None);
        p.name = "EcoPanel 5kW".to_string();
        p.brand = "SunTech".to_string();

        assert!(matches_search(&p, "suntech"));
        assert!(matches_search(&p, "ecopanel"));
        assert!(!matches_search(&p, "inverter"));
    }

    #[test]
    fn test_search_empty_fields_never_match() {
        let mut p = product("bare", 100, 5.0, None);
        p.brand = String::new();
        p.description = String::new();
        assert!(!matches_search(&p, "generic"));
    }

    #[test]
    fn test_post_process_sorts_before_search() {
        let mut a = product("a", 300, 1.0, None);
        a.description = "Mono PERC rooftop".to_string();
        let b = product("b", 100, 1.0, None);
        let mut c = product("c", 200, 1.0, None);
        c.description = "mono crystalline".to_string();

        let filters = FilterState {
            sort: SortKey::PriceLow,
            search: "  MONO ".to_string(),
            ..FilterState::default()
        };
        let result = post_process(vec![a, b, c], &filters);
        assert_eq!(ids(&result), ["c", "a"]);
    }

    #[test]
    fn test_residual_min_rating() {
        let filters = FilterState {
            min_rating: 4,
            ..FilterState::default()
        };
        let result = post_process(
            vec![
                product("hi", 100, 1.0, Some(4.5)),
                product("lo", 100, 1.0, Some(3.9)),
                product("none", 100, 1.0, None),
            ],
            &filters,
        );
        assert_eq!(ids(&result), ["hi"]);
    }

    #[test]
    fn test_residual_multi_brand() {
        let mut filters = FilterState::default();
        filters.toggle_brand("SunTech");
        filters.toggle_brand("Luminous");

        let mut a = product("a", 100, 1.0, None);
        a.brand = "SunTech".to_string();
        let mut b = product("b", 100, 1.0, None);
        b.brand = "Waaree".to_string();
        let mut c = product("c", 100, 1.0, None);
        c.brand = "Luminous".to_string();

        let result = post_process(vec![a, b, c], &filters);
        assert_eq!(ids(&result), ["a", "c"]);
    }
}
