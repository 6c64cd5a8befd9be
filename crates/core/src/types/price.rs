//! Type-safe price representation using decimal arithmetic.
//!
//! The backend exchanges prices as plain JSON numbers in Indian rupees. They
//! are held as [`Decimal`] so that cart subtotals never accumulate float
//! rounding error.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A price in rupees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(Decimal);

impl Price {
    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from whole rupees.
    #[must_use]
    pub fn from_rupees(rupees: i64) -> Self {
        Self(Decimal::from(rupees))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Whether the amount is strictly positive.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{:.2}", self.0)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

// Prices travel as JSON numbers, not the decimal string form.
impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        rust_decimal::serde::float::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer).map(Self)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_times_and_sum() {
        let unit = Price::from_rupees(45_000);
        assert_eq!(unit.times(3), Price::from_rupees(135_000));

        let total: Price = [unit, unit.times(2)].into_iter().sum();
        assert_eq!(total, Price::from_rupees(135_000));
    }

    #[test]
    fn test_price_deserializes_json_numbers() {
        let price: Price = serde_json::from_str("185000.0").unwrap();
        assert_eq!(price, Price::from_rupees(185_000));

        let price: Price = serde_json::from_str("99").unwrap();
        assert_eq!(price, Price::from_rupees(99));
    }

    #[test]
    fn test_price_serializes_as_number() {
        let json = serde_json::to_value(Price::from_rupees(1200)).unwrap();
        assert!(json.is_number());
        assert_eq!(json.as_f64(), Some(1200.0));
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::from_rupees(1500).to_string(), "₹1500.00");
    }

    #[test]
    fn test_is_positive() {
        assert!(Price::from_rupees(1).is_positive());
        assert!(!Price::ZERO.is_positive());
        assert!(!Price::from_rupees(-5).is_positive());
    }
}
