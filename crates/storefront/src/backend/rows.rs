//! Row shapes returned by the hosted REST API and their domain conversions.

use bw_core::{Color, Price, Product, ProductId, Sku, slugify};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::verification::{ProductSnapshot, VerificationRecord};

/// A `products` row.
///
/// Array columns may be `null` in older rows; stock may be negative after a
/// manual edit, which is clamped to zero.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductRow {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Decimal,
    pub color: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub images: Option<Vec<String>>,
    #[serde(default)]
    pub sizes: Option<Vec<String>>,
    #[serde(default)]
    pub stock_quantity: Option<i64>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl ProductRow {
    /// Convert to a [`Product`], or `None` if the row breaks a catalog invariant.
    pub fn into_product(self) -> Option<Product> {
        let price = match Price::new(self.price) {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!(product_id = %self.id, error = %e, "Skipping product row");
                return None;
            }
        };
        let color = match self.color.parse::<Color>() {
            Ok(color) => color,
            Err(e) => {
                tracing::warn!(product_id = %self.id, error = %e, "Skipping product row");
                return None;
            }
        };
        let stock = self
            .stock_quantity
            .map_or(0, |n| u32::try_from(n.max(0)).unwrap_or(u32::MAX));

        Some(Product {
            id: self.id,
            slug: self.slug.unwrap_or_else(|| slugify(&self.name)),
            name: self.name,
            description: self.description.unwrap_or_default(),
            price,
            color,
            category: self.category,
            images: self.images.unwrap_or_default(),
            sizes: self.sizes.unwrap_or_default(),
            stock,
            tags: self.tags.unwrap_or_default(),
            created_at: self.created_at,
        })
    }
}

/// An `orders` row, reduced to what verification shows.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderRow {
    pub sku: Sku,
    pub created_at: DateTime<Utc>,
    pub shipping: OrderShipping,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Purchaser part of an order's shipping column.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderShipping {
    pub name: String,
}

/// One line of an order's items column.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub unit_price: Price,
    pub color: Color,
    #[serde(default)]
    pub image: Option<String>,
}

impl OrderRow {
    /// Verification record showing the order's first item; `None` for an
    /// order with no items.
    pub fn into_verification_record(self) -> Option<VerificationRecord> {
        let first = self.items.into_iter().next()?;
        Some(VerificationRecord {
            sku: self.sku,
            product: ProductSnapshot {
                name: first.name,
                price: first.unit_price,
                image: first.image,
                color: first.color,
            },
            purchaser: self.shipping.name,
            purchase_date: self.created_at.date_naive(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_row_with_nulls() {
        let row: ProductRow = serde_json::from_value(serde_json::json!({
            "id": "6f1c3a9e-1d2b-4c5d-8e7f-0a1b2c3d4e5f",
            "name": "Pure White Tee",
            "price": 85,
            "color": "White",
            "images": null,
            "stock_quantity": -3
        }))
        .unwrap();

        let product = row.into_product().unwrap();
        assert_eq!(product.slug, "pure-white-tee");
        assert_eq!(product.color, Color::White);
        assert_eq!(product.stock, 0);
        assert!(product.images.is_empty());
    }

    #[test]
    fn test_product_row_with_string_price() {
        let row: ProductRow = serde_json::from_value(serde_json::json!({
            "id": "6f1c3a9e-1d2b-4c5d-8e7f-0a1b2c3d4e5f",
            "name": "Midnight Black Premium",
            "price": "95.00",
            "color": "black",
            "stock_quantity": 4
        }))
        .unwrap();
        let product = row.into_product().unwrap();
        assert_eq!(product.price.amount(), Decimal::new(9500, 2));
        assert_eq!(product.stock, 4);
    }

    #[test]
    fn test_product_row_rejects_zero_price_and_unknown_color() {
        let base = serde_json::json!({
            "id": "6f1c3a9e-1d2b-4c5d-8e7f-0a1b2c3d4e5f",
            "name": "Grey Tee",
            "price": 0,
            "color": "black"
        });
        let row: ProductRow = serde_json::from_value(base.clone()).unwrap();
        assert!(row.into_product().is_none());

        let mut grey = base;
        grey["price"] = serde_json::json!(50);
        grey["color"] = serde_json::json!("grey");
        let row: ProductRow = serde_json::from_value(grey).unwrap();
        assert!(row.into_product().is_none());
    }

    #[test]
    fn test_order_row_to_verification_record() {
        let row: OrderRow = serde_json::from_value(serde_json::json!({
            "sku": "bw123456",
            "created_at": "2024-12-15T10:30:00Z",
            "shipping": { "name": "John Doe", "city": "Oslo" },
            "items": [
                { "name": "Essential Black Tee", "unit_price": "85", "color": "black" }
            ]
        }))
        .unwrap();

        let record = row.into_verification_record().unwrap();
        assert_eq!(record.sku.as_str(), "BW123456");
        assert_eq!(record.purchaser, "John Doe");
        assert_eq!(record.purchase_date.to_string(), "2024-12-15");
    }

    #[test]
    fn test_order_row_without_items() {
        let row: OrderRow = serde_json::from_value(serde_json::json!({
            "sku": "BW000001",
            "created_at": "2024-12-15T10:30:00Z",
            "shipping": { "name": "John Doe" }
        }))
        .unwrap();
        assert!(row.into_verification_record().is_none());
    }
}
