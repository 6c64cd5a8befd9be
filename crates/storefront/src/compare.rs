//! Best-value highlighting for the compare table.

use core::fmt;

use solarmart_core::{Price, Product};

/// A row of the compare table that can carry a highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareField {
    /// Lowest wins.
    Price,
    SystemSize,
    Efficiency,
    Warranty,
    Rating,
}

impl CompareField {
    pub const ALL: [Self; 5] = [
        Self::Price,
        Self::SystemSize,
        Self::Efficiency,
        Self::Warranty,
        Self::Rating,
    ];

    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Price => "Price",
            Self::SystemSize => "System Size",
            Self::Efficiency => "Efficiency",
            Self::Warranty => "Warranty",
            Self::Rating => "Rating",
        }
    }

    /// Missing ratings count as 0.
    fn numeric(self, product: &Product) -> f64 {
        match self {
            Self::Price => 0.0,
            Self::SystemSize => product.system_size_kw,
            Self::Efficiency => product.efficiency_rating,
            Self::Warranty => f64::from(product.warranty_years),
            Self::Rating => product.rating_or_zero(),
        }
    }
}

impl fmt::Display for CompareField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Highlight flags for one field, parallel to the compared products.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRow {
    pub field: CompareField,
    pub best: Vec<bool>,
}

/// Flags for every field. Ties are all highlighted; with fewer than two
/// products nothing is.
#[must_use]
pub fn compare_rows(products: &[Product]) -> Vec<CompareRow> {
    CompareField::ALL
        .into_iter()
        .map(|field| CompareRow {
            field,
            best: best_flags(products, field),
        })
        .collect()
}

/// Which products hold the best value for `field`.
#[must_use]
pub fn best_flags(products: &[Product], field: CompareField) -> Vec<bool> {
    if products.len() < 2 {
        return vec![false; products.len()];
    }

    if field == CompareField::Price {
        let Some(min) = products.iter().map(|p| p.price).min() else {
            return Vec::new();
        };
        return products.iter().map(|p| p.price == min).collect();
    }

    let max = products
        .iter()
        .map(|p| field.numeric(p))
        .fold(f64::NEG_INFINITY, f64::max);
    products
        .iter()
        .map(|p| field.numeric(p).total_cmp(&max).is_eq())
        .collect()
}

/// Lowest price among the compared products.
#[must_use]
pub fn lowest_price(products: &[Product]) -> Option<Price> {
    products.iter().map(|p| p.price).min()
}
