//! Cache types for backend responses.

use solarmart_core::{Category, Product, ProductId};

/// Cache key for cacheable reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Featured {
        category: Option<Category>,
        limit: u32,
    },
    Brands,
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
    Brands(Vec<String>),
}
