//! Presentation values derived from a [`Product`].
//!
//! Backend records may omit `rating`, `review_count` and `original_price`;
//! every fallback for a missing field lives here so cards, detail pages and the
//! compare table agree.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use solarmart_core::Product;

/// Rating shown when a product has none yet.
pub const DEFAULT_DISPLAY_RATING: f64 = 4.5;

/// Efficiency percentage at or above which a product gets the badge.
pub const HIGH_EFFICIENCY_THRESHOLD: f64 = 20.0;

/// Display data for product cards and the detail page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProductView {
    /// Whole-percent saving against `original_price`, never negative.
    pub discount_percent: u32,
    /// Number of filled stars, 0 to 5.
    pub filled_stars: u8,
    pub is_high_efficiency: bool,
    pub is_on_sale: bool,
    /// Rating for the rating line, with the default applied.
    pub display_rating: f64,
    pub review_count: u32,
}

/// Compute the display values for one product.
#[must_use]
pub fn derive_view(product: &Product) -> ProductView {
    let discount_percent = discount_percent(product);
    let display_rating = product.rating.unwrap_or(DEFAULT_DISPLAY_RATING);

    ProductView {
        discount_percent,
        filled_stars: filled_stars(display_rating),
        is_high_efficiency: product.efficiency_rating >= HIGH_EFFICIENCY_THRESHOLD,
        is_on_sale: discount_percent > 0,
        display_rating,
        review_count: product.review_count.unwrap_or(0),
    }
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        derive_view(product)
    }
}

/// `round((1 - price / original) * 100)`, half away from zero, clamped at 0.
fn discount_percent(product: &Product) -> u32 {
    let Some(original) = product.original_price.map(|p| p.amount()) else {
        return 0;
    };
    if original <= Decimal::ZERO {
        return 0;
    }

    // An original price small enough to overflow the ratio shows no discount
    let Some(percent) = product
        .price
        .amount()
        .checked_div(original)
        .and_then(|ratio| Decimal::ONE.checked_sub(ratio))
        .and_then(|fraction| fraction.checked_mul(Decimal::ONE_HUNDRED))
    else {
        return 0;
    };
    let percent = percent.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    if percent.is_sign_negative() {
        0
    } else {
        percent.to_u32().unwrap_or(0)
    }
}

// Allow: the value is floored and clamped to [0, 5] first
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn filled_stars(rating: f64) -> u8 {
    if rating.is_nan() {
        return 0;
    }
    rating.floor().clamp(0.0, 5.0) as u8
}

#[cfg(test)]
mod tests {
    use solarmart_core::{Category, Price, ProductId};

    use super::*;

    fn product() -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Rooftop Kit".to_string(),
            category: Category::Home,
            brand: "SunTech".to_string(),
            price: Price::from_rupees(100),
            original_price: None,
            system_size_kw: 5.0,
            efficiency_rating: 19.9,
            rating: None,
            review_count: None,
            image_url: String::new(),
            description: String::new(),
            features: Vec::new(),
            vendor_name: String::new(),
            warranty_years: 25,
            in_stock: true,
        }
    }

    #[test]
    fn test_missing_optionals_use_defaults() {
        let view = derive_view(&product());
        assert_eq!(view.discount_percent, 0);
        assert!(!view.is_on_sale);
        assert!((view.display_rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(view.filled_stars, 4);
        assert_eq!(view.review_count, 0);
        assert!(!view.is_high_efficiency);
    }

    #[test]
    fn test_discount_rounds() {
        let mut p = product();
        p.price = Price::from_rupees(85_000);
        p.original_price = Some(Price::from_rupees(100_000));
        assert_eq!(derive_view(&p).discount_percent, 15);

        // 1 - 2/3 = 33.33..%
        p.price = Price::from_rupees(2);
        p.original_price = Some(Price::from_rupees(3));
        assert_eq!(derive_view(&p).discount_percent, 33);

        // 1 - 1/8 = 87.5% rounds up
        p.price = Price::from_rupees(1);
        p.original_price = Some(Price::from_rupees(8));
        let view = derive_view(&p);
        assert_eq!(view.discount_percent, 88);
        assert!(view.is_on_sale);
    }

    #[test]
    fn test_discount_clamped_when_original_below_price() {
        let mut p = product();
        p.price = Price::from_rupees(120);
        p.original_price = Some(Price::from_rupees(100));
        let view = derive_view(&p);
        assert_eq!(view.discount_percent, 0);
        assert!(!view.is_on_sale);
    }

    #[test]
    fn test_zero_original_price_is_no_discount() {
        let mut p = product();
        p.original_price = Some(Price::ZERO);
        assert_eq!(derive_view(&p).discount_percent, 0);
    }

    #[test]
    fn test_tiny_original_price_is_no_discount() {
        let mut p = product();
        p.price = Price::from_rupees(250_000);
        p.original_price = Some(Price::new(Decimal::new(1, 24)));
        assert_eq!(derive_view(&p).discount_percent, 0);

        p.price = Price::from_rupees(10_000_000);
        p.original_price = Some(Price::new(Decimal::new(1, 22)));
        let view = derive_view(&p);
        assert_eq!(view.discount_percent, 0);
        assert!(!view.is_on_sale);
    }

    #[test]
    fn test_filled_stars_clamped() {
        let mut p = product();
        p.rating = Some(3.99);
        assert_eq!(derive_view(&p).filled_stars, 3);
        p.rating = Some(7.0);
        assert_eq!(derive_view(&p).filled_stars, 5);
        p.rating = Some(-1.0);
        assert_eq!(derive_view(&p).filled_stars, 0);
        p.rating = Some(0.0);
        assert_eq!(derive_view(&p).filled_stars, 0);
    }

    #[test]
    fn test_high_efficiency_threshold_inclusive() {
        let mut p = product();
        p.efficiency_rating = 20.0;
        assert!(ProductView::from(&p).is_high_efficiency);
    }
}
