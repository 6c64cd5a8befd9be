//! Savings calculator request and response bodies.
//!
//! The estimate itself is computed by the backend; these types only carry
//! the user's form input there and the result back.

use serde::{Deserialize, Serialize};

use super::product::Category;

/// Errors that can occur when validating a [`CalculatorForm`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CalculatorFormError {
    /// Monthly bill or city was left blank.
    #[error("Please fill all required fields")]
    MissingRequired,
    /// Monthly bill is not a positive number.
    #[error("monthly bill must be a positive number (got {0:?})")]
    InvalidBill(String),
}

/// Raw calculator form as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalculatorForm {
    pub monthly_bill: String,
    pub property_type: Category,
    pub city: String,
    pub backup_required: bool,
}

impl Default for CalculatorForm {
    fn default() -> Self {
        Self {
            monthly_bill: String::new(),
            property_type: Category::Home,
            city: String::new(),
            backup_required: false,
        }
    }
}

impl CalculatorForm {
    /// Validate the form into a request body for `POST /calculator`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bill or city is blank, or the bill does not
    /// parse as a positive number.
    pub fn into_input(self) -> Result<CalculatorInput, CalculatorFormError> {
        let bill = self.monthly_bill.trim();
        let city = self.city.trim();
        if bill.is_empty() || city.is_empty() {
            return Err(CalculatorFormError::MissingRequired);
        }

        let monthly_bill = bill
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .ok_or_else(|| CalculatorFormError::InvalidBill(bill.to_owned()))?;

        Ok(CalculatorInput {
            monthly_bill,
            property_type: self.property_type,
            city: city.to_owned(),
            backup_required: self.backup_required,
        })
    }
}

/// Request body for `POST /calculator`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorInput {
    pub monthly_bill: f64,
    pub property_type: Category,
    pub city: String,
    pub backup_required: bool,
}

/// Savings estimate returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatorEstimate {
    pub recommended_size_kw: f64,
    pub estimated_cost: f64,
    pub annual_savings: f64,
    pub payback_years: f64,
    pub co2_reduction_kg: f64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(bill: &str, city: &str) -> CalculatorForm {
        CalculatorForm {
            monthly_bill: bill.to_string(),
            city: city.to_string(),
            ..CalculatorForm::default()
        }
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert_eq!(
            form("", "Pune").into_input(),
            Err(CalculatorFormError::MissingRequired)
        );
        assert_eq!(
            form("4500", "  ").into_input(),
            Err(CalculatorFormError::MissingRequired)
        );
    }

    #[test]
    fn test_non_numeric_bill_rejected() {
        assert!(matches!(
            form("lots", "Pune").into_input(),
            Err(CalculatorFormError::InvalidBill(_))
        ));
        assert!(matches!(
            form("-10", "Pune").into_input(),
            Err(CalculatorFormError::InvalidBill(_))
        ));
    }

    #[test]
    fn test_valid_form_serializes_wire_body() {
        let input = form("4500", " Pune ").into_input().unwrap();
        let body = serde_json::to_value(&input).unwrap();
        assert_eq!(body["monthly_bill"], 4500.0);
        assert_eq!(body["property_type"], "home");
        assert_eq!(body["city"], "Pune");
        assert_eq!(body["backup_required"], false);
    }
}
