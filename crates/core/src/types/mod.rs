//! Core types for SolarMart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod calculator;
pub mod id;
pub mod price;
pub mod product;
pub mod review;

pub use calculator::{CalculatorEstimate, CalculatorForm, CalculatorFormError, CalculatorInput};
pub use id::*;
pub use price::Price;
pub use product::{Category, CategoryError, Product};
pub use review::{Review, ReviewDraft, ReviewDraftError, ReviewReceipt, ReviewSubmission};
