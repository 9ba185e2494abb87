//! Cart line items and orders.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{LineItemId, OrderId, ProductId};
use super::price::Price;
use super::product::Color;
use super::shipping::ShippingInfo;
use super::sku::Sku;
use super::status::{OrderStatus, PaymentMethod};

/// One row of the cart, unique per `(product_id, size)`.
///
/// Name, color and image are denormalized from the product at add time so the
/// cart renders without a catalog lookup. `unit_price` is likewise a snapshot:
/// later catalog price changes do not affect items already in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub id: LineItemId,
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub name: String,
    pub color: Color,
    #[serde(default)]
    pub image: Option<String>,
}

impl CartLineItem {
    /// `unit_price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price.times(self.quantity)
    }

    /// Whether this line holds the given product in the given size.
    #[must_use]
    pub fn is_same_variant(&self, product_id: ProductId, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Order code handed to the shopper for verification and support.
    pub sku: Sku,
    pub items: Vec<CartLineItem>,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping: ShippingInfo,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_line_total() {
        let line = CartLineItem {
            id: LineItemId::new(),
            product_id: ProductId::new(),
            size: "M".to_string(),
            quantity: 3,
            unit_price: Price::from_units(85).unwrap(),
            name: "Essential Black Tee".to_string(),
            color: Color::Black,
            image: None,
        };
        assert_eq!(line.line_total(), Decimal::from(255));
        assert!(line.is_same_variant(line.product_id, "M"));
        assert!(!line.is_same_variant(line.product_id, "L"));
    }
}
