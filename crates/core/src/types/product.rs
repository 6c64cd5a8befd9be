//! Catalog product records as served by the backend.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Errors that can occur when parsing a [`Category`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct CategoryError(pub String);

/// Market segment a product is sold into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Residential rooftop systems.
    Home,
    /// Commercial and industrial systems.
    Commercial,
}

impl Category {
    /// Wire representation used in query strings and JSON.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Commercial => "commercial",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = CategoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "home" => Ok(Self::Home),
            "commercial" => Ok(Self::Commercial),
            other => Err(CategoryError(other.to_owned())),
        }
    }
}

/// A solar system listed in the catalog.
///
/// Products are owned by the backend and never mutated client-side; a refetch
/// replaces them wholesale. Optional fields reflect what the backend may omit,
/// and every derived computation must tolerate their absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub category: Category,
    /// Manufacturer brand. Empty when the backend omits it.
    #[serde(default)]
    pub brand: String,
    pub price: Price,
    /// Pre-discount price, when the product is on offer.
    #[serde(default)]
    pub original_price: Option<Price>,
    pub system_size_kw: f64,
    /// Panel efficiency in percent.
    pub efficiency_rating: f64,
    /// Average review rating on a 0-5 scale.
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub vendor_name: String,
    pub warranty_years: u32,
    #[serde(default = "default_in_stock")]
    pub in_stock: bool,
}

const fn default_in_stock() -> bool {
    true
}

impl Product {
    /// Rating used for ordering and thresholds; a missing rating counts as 0.
    #[must_use]
    pub fn rating_or_zero(&self) -> f64 {
        self.rating.unwrap_or(0.0)
    }
}
