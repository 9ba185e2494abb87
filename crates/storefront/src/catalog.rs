//! Product catalog.
//!
//! Shoppers browse either the built-in launch collection or, when a hosted
//! backend is configured, the `products` table. Filtering happens here in
//! both cases so the two sources behave identically.

use std::str::FromStr;

use bw_core::{Color, Price, Product, ProductId, Uuid, slugify};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use crate::backend::{BackendClient, BackendError};

pub(crate) const BLACK_TEE_IMAGE: &str =
    "https://images.pexels.com/photos/2113994/pexels-photo-2113994.jpeg?auto=compress&cs=tinysrgb&w=800";
pub(crate) const WHITE_TEE_IMAGE: &str =
    "https://images.pexels.com/photos/8532616/pexels-photo-8532616.jpeg?auto=compress&cs=tinysrgb&w=800";
pub(crate) const PREMIUM_TEE_IMAGE: &str =
    "https://images.pexels.com/photos/5698851/pexels-photo-5698851.jpeg?auto=compress&cs=tinysrgb&w=800";

/// Stable IDs of the launch collection.
pub const ESSENTIAL_BLACK_TEE: ProductId =
    ProductId::from_uuid(Uuid::from_u128(0x0b1a_c4ee_0000_4000_8000_0000_0000_0001));
pub const PURE_WHITE_TEE: ProductId =
    ProductId::from_uuid(Uuid::from_u128(0x0b1a_c4ee_0000_4000_8000_0000_0000_0002));
pub const MIDNIGHT_BLACK_PREMIUM: ProductId =
    ProductId::from_uuid(Uuid::from_u128(0x0b1a_c4ee_0000_4000_8000_0000_0000_0003));

// =============================================================================
// Filters
// =============================================================================

/// Unrecognized filter value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind} filter '{value}'")]
pub struct FilterParseError {
    pub kind: &'static str,
    pub value: String,
}

/// Price range buckets offered in the shop sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceBand {
    /// Below 90.
    Under90,
    /// 90 to 100 inclusive.
    From90To100,
    /// Above 100.
    Over100,
}

impl PriceBand {
    #[must_use]
    pub fn contains(self, price: Price) -> bool {
        let amount = price.amount();
        let ninety = Decimal::from(90);
        let hundred = Decimal::from(100);
        match self {
            Self::Under90 => amount < ninety,
            Self::From90To100 => amount >= ninety && amount <= hundred,
            Self::Over100 => amount > hundred,
        }
    }
}

impl FromStr for PriceBand {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "under-90" | "under_90" => Ok(Self::Under90),
            "90-100" | "90_to_100" => Ok(Self::From90To100),
            "over-100" | "over_100" => Ok(Self::Over100),
            _ => Err(FilterParseError {
                kind: "price",
                value: s.to_owned(),
            }),
        }
    }
}

/// Garment category, derived from product tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Top,
    Bottom,
}

impl Category {
    const fn tags(self) -> &'static [&'static str] {
        match self {
            Self::Top => &["tee", "shirt"],
            Self::Bottom => &["pants", "shorts"],
        }
    }

    /// Whether the product is in this category, by tag or explicit category.
    #[must_use]
    pub fn matches(self, product: &Product) -> bool {
        let tags = self.tags();
        product
            .tags
            .iter()
            .chain(product.category.iter())
            .any(|tag| tags.iter().any(|t| tag.eq_ignore_ascii_case(t)))
    }
}

impl FromStr for Category {
    type Err = FilterParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "tops" => Ok(Self::Top),
            "bottom" | "bottoms" => Ok(Self::Bottom),
            _ => Err(FilterParseError {
                kind: "category",
                value: s.to_owned(),
            }),
        }
    }
}

/// Shop listing filter. Every `None` criterion matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub color: Option<Color>,
    pub price: Option<PriceBand>,
    pub category: Option<Category>,
}

impl ProductFilter {
    /// Build a filter from raw query values. Empty values and `"all"` mean
    /// "no constraint".
    ///
    /// # Errors
    ///
    /// Returns an error for an unrecognized color, price band or category.
    pub fn from_query(
        search: Option<&str>,
        color: Option<&str>,
        price: Option<&str>,
        category: Option<&str>,
    ) -> Result<Self, FilterParseError> {
        let color = match constraint(color) {
            Some(raw) => Some(raw.parse::<Color>().map_err(|_| FilterParseError {
                kind: "color",
                value: raw.to_owned(),
            })?),
            None => None,
        };
        Ok(Self {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            color,
            price: constraint(price).map(str::parse::<PriceBand>).transpose()?,
            category: constraint(category)
                .map(str::parse::<Category>)
                .transpose()?,
        })
    }

    /// Whether `product` passes every criterion.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let hit = product.name.to_lowercase().contains(&needle)
                || product
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        self.color.is_none_or(|color| product.color == color)
            && self.price.is_none_or(|band| band.contains(product.price))
            && self.category.is_none_or(|category| category.matches(product))
    }
}

fn constraint(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("all"))
}

// =============================================================================
// Catalog
// =============================================================================

/// Where products come from.
pub enum Catalog {
    /// The built-in launch collection.
    Seeded(Vec<Product>),
    /// The hosted `products` table.
    Backend(BackendClient),
}

impl Catalog {
    /// The built-in launch collection.
    #[must_use]
    pub fn seeded() -> Self {
        Self::Seeded(seed_products())
    }

    /// Products matching `filter`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns an error if the hosted backend cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, BackendError> {
        let products = match self {
            Self::Seeded(products) => products.clone(),
            Self::Backend(client) => client.list_products().await?,
        };
        Ok(products
            .into_iter()
            .filter(|product| filter.matches(product))
            .collect())
    }

    /// One product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the hosted backend cannot be read.
    #[instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, BackendError> {
        match self {
            Self::Seeded(products) => Ok(products.iter().find(|p| p.id == id).cloned()),
            Self::Backend(client) => client.get_product(id).await,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn seeded_product(
    id: ProductId,
    name: &str,
    description: &str,
    price: u32,
    color: Color,
    image: &str,
    stock: u32,
    tags: &[&str],
) -> Option<Product> {
    Some(Product {
        id,
        name: name.to_owned(),
        slug: slugify(name),
        description: description.to_owned(),
        price: Price::from_units(price).ok()?,
        color,
        category: Some("tee".to_owned()),
        images: vec![image.to_owned()],
        sizes: ["M", "L", "XL", "XXL"].map(str::to_owned).to_vec(),
        stock,
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        created_at: None,
    })
}

/// The launch collection.
#[must_use]
pub fn seed_products() -> Vec<Product> {
    [
        seeded_product(
            ESSENTIAL_BLACK_TEE,
            "Essential Black Tee",
            "Heavyweight cotton tee in deep black. Relaxed fit, ribbed collar.",
            85,
            Color::Black,
            BLACK_TEE_IMAGE,
            12,
            &["black", "essential", "premium", "tee"],
        ),
        seeded_product(
            PURE_WHITE_TEE,
            "Pure White Tee",
            "Heavyweight cotton tee in optic white. Relaxed fit, ribbed collar.",
            85,
            Color::White,
            WHITE_TEE_IMAGE,
            8,
            &["white", "essential", "premium", "tee"],
        ),
        seeded_product(
            MIDNIGHT_BLACK_PREMIUM,
            "Midnight Black Premium",
            "Limited run in garment-dyed black with a brushed finish.",
            95,
            Color::Black,
            PREMIUM_TEE_IMAGE,
            0,
            &["black", "premium", "limited", "tee"],
        ),
    ]
    .into_iter()
    .flatten()
    .collect()
}
