//! Type-safe price representation using decimal arithmetic.
//!
//! Unit prices are strictly positive. Totals (which may be zero for an empty
//! cart) are plain [`Decimal`] values.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is zero or negative.
    #[error("price must be greater than zero (got {0})")]
    NotPositive(Decimal),
    /// The amount could not be parsed as a decimal number.
    #[error("price is not a number: {0}")]
    Unparsable(String),
}

/// A strictly positive unit price in the store currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Create a new price.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotPositive`] if `amount <= 0`.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive(amount));
        }
        Ok(Self(amount))
    }

    /// Parse a price from user input such as `"85"` or `" 95.50 "`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a number or is not positive.
    pub fn parse(input: &str) -> Result<Self, PriceError> {
        let amount = input
            .trim()
            .parse::<Decimal>()
            .map_err(|_| PriceError::Unparsable(input.to_owned()))?;
        Self::new(amount)
    }

    /// Build a price from whole currency units.
    ///
    /// # Errors
    ///
    /// Returns an error if `units` is zero.
    pub fn from_units(units: u32) -> Result<Self, PriceError> {
        Self::new(Decimal::from(units))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price multiplied by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Decimal {
        self.0 * Decimal::from(quantity)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_amount(self.0))
    }
}

/// Format an amount for display with two decimal places (e.g. `"$85.00"`).
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(
            Price::new(Decimal::ZERO),
            Err(PriceError::NotPositive(Decimal::ZERO))
        );
        assert!(Price::new(Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_parse_trims_input() {
        let price = Price::parse(" 95.50 ").unwrap();
        assert_eq!(price.amount(), Decimal::new(9550, 2));
    }

    #[test]
    fn test_parse_rejects_text() {
        assert!(matches!(Price::parse("eighty"), Err(PriceError::Unparsable(_))));
    }

    #[test]
    fn test_times_quantity() {
        let price = Price::from_units(85).unwrap();
        assert_eq!(price.times(3), Decimal::from(255));
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_units(85).unwrap().to_string(), "$85.00");
        assert_eq!(format_amount(Decimal::new(12346, 3)), "$12.35");
    }

    #[test]
    fn test_deserialize_accepts_numbers_and_strings() {
        let from_number: Price = serde_json::from_str("85").unwrap();
        let from_string: Price = serde_json::from_str("\"85\"").unwrap();
        assert_eq!(from_number, from_string);
        assert!(serde_json::from_str::<Price>("0").is_err());
    }
}
