//! SKU / order codes.
//!
//! Codes are generated at checkout and later typed back in by shoppers to
//! verify a purchase, so comparison is case-insensitive: every [`Sku`] is
//! stored trimmed and upper-cased.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Prefix of every order code generated at checkout.
pub const ORDER_CODE_PREFIX: &str = "BW";

/// Number of timestamp digits appended to [`ORDER_CODE_PREFIX`].
pub const ORDER_CODE_DIGITS: usize = 6;

/// Errors that can occur when parsing a [`Sku`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SkuError {
    /// The code is empty after trimming.
    #[error("SKU cannot be empty")]
    Empty,
    /// The code is longer than [`Sku::MAX_LENGTH`].
    #[error("SKU must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The code contains characters other than ASCII letters, digits and dashes.
    #[error("SKU may only contain letters, digits and dashes")]
    InvalidCharacter,
}

/// A normalized SKU code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    /// Maximum accepted code length.
    pub const MAX_LENGTH: usize = 64;

    /// Parse and normalize a user-supplied code.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed code is empty, too long, or contains
    /// characters outside `[A-Za-z0-9-]`.
    pub fn parse(input: &str) -> Result<Self, SkuError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SkuError::Empty);
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(SkuError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            return Err(SkuError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Generate an order code from a millisecond timestamp.
    ///
    /// The code is [`ORDER_CODE_PREFIX`] followed by the last six decimal
    /// digits of the timestamp, zero padded.
    #[must_use]
    pub fn order_code(timestamp_millis: i64) -> Self {
        let suffix = timestamp_millis.rem_euclid(1_000_000);
        Self(format!(
            "{ORDER_CODE_PREFIX}{suffix:0width$}",
            width = ORDER_CODE_DIGITS
        ))
    }

    /// Whether this code has the shape of a checkout-generated order code.
    #[must_use]
    pub fn is_order_code(&self) -> bool {
        self.0
            .strip_prefix(ORDER_CODE_PREFIX)
            .is_some_and(|digits| {
                digits.len() == ORDER_CODE_DIGITS && digits.bytes().all(|b| b.is_ascii_digit())
            })
    }

    /// Returns the normalized code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Sku {
    type Err = SkuError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Sku {
    type Error = SkuError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self {
        sku.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let sku = Sku::parse("  bw001234 ").unwrap();
        assert_eq!(sku.as_str(), "BW001234");
        assert_eq!(sku, Sku::parse("BW001234").unwrap());
    }

    #[test]
    fn test_parse_rejects_empty_and_symbols() {
        assert_eq!(Sku::parse("   "), Err(SkuError::Empty));
        assert_eq!(Sku::parse("BW 001"), Err(SkuError::InvalidCharacter));
        assert_eq!(Sku::parse("BW_001"), Err(SkuError::InvalidCharacter));
    }

    #[test]
    fn test_order_code_uses_last_six_digits() {
        let code = Sku::order_code(1_734_567_891_234);
        assert_eq!(code.as_str(), "BW891234");
        assert!(code.is_order_code());
    }

    #[test]
    fn test_order_code_zero_pads() {
        assert_eq!(Sku::order_code(1_700_000_000_042).as_str(), "BW000042");
    }

    #[test]
    fn test_fixture_codes_are_not_all_order_codes() {
        assert!(Sku::parse("BW001234").unwrap().is_order_code());
        assert!(!Sku::parse("BWB001").unwrap().is_order_code());
    }
}
