//! SolarMart storefront session SDK.
//!
//! Client-side state and backend access for the SolarMart shop:
//!
//! - [`session`]: cart, wishlist and compare list, persisted across reloads
//! - [`catalog`]: listing criteria, ticketed refetches and post-processing
//! - [`api`]: REST client for the product, review and calculator endpoints
//! - [`actions`]: page-level handlers that return user-facing notices
//!
//! # Example
//!
//! ```rust,ignore
//! let config = StorefrontConfig::from_env()?;
//! let _telemetry = telemetry::init(&config);
//!
//! let client = ApiClient::new(&config)?;
//! let store = SessionStore::restore(storage_from_config(&config)?, &client).await;
//! let catalog = Catalog::new(client.clone(), CatalogQuery::new());
//! catalog.refresh().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod actions;
pub mod api;
pub mod catalog;
pub mod compare;
pub mod config;
pub mod error;
pub mod session;
pub mod telemetry;
pub mod view;

pub use api::{ApiClient, ApiError, BearerToken};
pub use catalog::{Catalog, CatalogQuery, FilterState, SortKey};
pub use config::StorefrontConfig;
pub use error::{Notice, NoticeLevel, Route, StorefrontError};
pub use session::{SessionStore, storage_from_config};
pub use view::{ProductView, derive_view};
