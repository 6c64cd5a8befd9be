//! SolarMart Core - Shared types library.
//!
//! This crate provides the domain types shared by the SolarMart components:
//! - `storefront` - Session store, catalog query pipeline and backend client
//! - `integration-tests` - Mock backend and black-box tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure helpers - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and allows it to be
//! used anywhere (including the mock backend in tests).
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, prices, products, reviews and calculator DTOs

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
