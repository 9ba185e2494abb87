//! Catalog product types.

use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::Price;

/// Product colorway. The brand only ships black or white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Black,
    White,
}

/// Error returned when a color name is not `black` or `white`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown color '{0}', expected black or white")]
pub struct ColorError(pub String);

impl Color {
    /// Lowercase wire name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Black => "black",
            Self::White => "white",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "black" => Ok(Self::Black),
            "white" => Ok(Self::White),
            _ => Err(ColorError(s.to_owned())),
        }
    }
}

/// A catalog entry.
///
/// Created by the admin editor, read-only to shoppers. `stock` is unsigned so
/// a negative count is unrepresentable; `price` is a [`Price`] so it is always
/// positive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    pub color: Color,
    #[serde(default)]
    pub category: Option<String>,
    /// Image URLs, primary image first.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Whether at least one unit is available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }

    /// First image, used for cart thumbnails and verification snapshots.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// The catalog spelling of `size`, if the product is offered in it.
    #[must_use]
    pub fn offered_size(&self, size: &str) -> Option<&str> {
        self.sizes
            .iter()
            .find(|s| s.eq_ignore_ascii_case(size))
            .map(String::as_str)
    }
}

/// A stored image belonging to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub product_id: ProductId,
    pub image_url: String,
    pub is_primary: bool,
}

/// Build a URL slug from a product name (`"Pure White Tee"` -> `"pure-white-tee"`).
#[must_use]
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
