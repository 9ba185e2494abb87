//! Pre-orders for the next collection.
//!
//! The upcoming drop comes in both colorways at one price. Shoppers reserve
//! a color, size and quantity ahead of release; reservations are confirmed
//! immediately and persisted under [`PREORDERS_STORAGE_KEY`]. No payment is
//! taken until the collection ships.

use std::sync::Arc;

use bw_core::{Color, ColorError, PreOrderId, Price, format_amount};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::storage::{ClientStorage, StorageError, load_json, save_json};

/// Storage key holding placed pre-orders.
pub const PREORDERS_STORAGE_KEY: &str = "preorders";

const COLLECTION_NAME: &str = "February 2025 Collection";
const COLLECTION_PRICE: u32 = 85;
const COLLECTION_SIZES: [&str; 4] = ["M", "L", "XL", "XXL"];

const RELEASE_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 2, 1) {
    Some(date) => date,
    None => panic!("invalid release date"),
};
const SHIP_DATE: NaiveDate = match NaiveDate::from_ymd_opt(2025, 2, 5) {
    Some(date) => date,
    None => panic!("invalid ship date"),
};

const BLACK_PREVIEWS: [&str; 3] = [
    "https://images.pexels.com/photos/2113994/pexels-photo-2113994.jpeg?auto=compress&cs=tinysrgb&w=400",
    "https://images.pexels.com/photos/1040945/pexels-photo-1040945.jpeg?auto=compress&cs=tinysrgb&w=400",
    "https://images.pexels.com/photos/3755706/pexels-photo-3755706.jpeg?auto=compress&cs=tinysrgb&w=400",
];
const WHITE_PREVIEWS: [&str; 3] = [
    "https://images.pexels.com/photos/8532616/pexels-photo-8532616.jpeg?auto=compress&cs=tinysrgb&w=400",
    "https://images.pexels.com/photos/7679720/pexels-photo-7679720.jpeg?auto=compress&cs=tinysrgb&w=400",
    "https://images.pexels.com/photos/5698357/pexels-photo-5698357.jpeg?auto=compress&cs=tinysrgb&w=400",
];

/// Preview images for one colorway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionPreview {
    pub color: Color,
    pub images: Vec<String>,
}

/// The collection open for pre-order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NextCollection {
    pub name: String,
    pub release_date: NaiveDate,
    pub ships_on: NaiveDate,
    pub unit_price: Price,
    pub unit_price_display: String,
    pub sizes: Vec<String>,
    pub previews: Vec<CollectionPreview>,
}

impl NextCollection {
    /// The upcoming drop.
    ///
    /// # Errors
    ///
    /// Fails only if the configured price is not a valid [`Price`].
    pub fn current() -> Result<Self, PreOrderError> {
        let unit_price =
            Price::from_units(COLLECTION_PRICE).map_err(|e| PreOrderError::Pricing(e.to_string()))?;
        let previews = [(Color::Black, BLACK_PREVIEWS), (Color::White, WHITE_PREVIEWS)]
            .into_iter()
            .map(|(color, images)| CollectionPreview {
                color,
                images: images.iter().map(|s| (*s).to_owned()).collect(),
            })
            .collect();

        Ok(Self {
            name: COLLECTION_NAME.to_owned(),
            release_date: RELEASE_DATE,
            ships_on: SHIP_DATE,
            unit_price,
            unit_price_display: unit_price.to_string(),
            sizes: COLLECTION_SIZES.iter().map(|s| (*s).to_owned()).collect(),
            previews,
        })
    }

    /// The collection's spelling of `size`, if offered.
    fn size(&self, size: &str) -> Option<&str> {
        self.sizes
            .iter()
            .find(|s| s.eq_ignore_ascii_case(size.trim()))
            .map(String::as_str)
    }
}

/// Pre-order form as submitted.
#[derive(Debug, Clone, Deserialize)]
pub struct PreOrderForm {
    pub color: String,
    pub size: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

/// Why a pre-order was not placed.
#[derive(Debug, Error)]
pub enum PreOrderError {
    #[error(transparent)]
    InvalidColor(#[from] ColorError),

    #[error("size '{0}' is not offered in the next collection")]
    SizeUnavailable(String),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("collection pricing error: {0}")]
    Pricing(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A confirmed reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreOrder {
    pub id: PreOrderId,
    pub collection: String,
    pub color: Color,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub total: Decimal,
    pub total_display: String,
    pub ships_on: NaiveDate,
    pub placed_at: DateTime<Utc>,
}

/// Pre-orders placed by this shopper.
pub struct PreOrderBook {
    orders: Vec<PreOrder>,
    storage: Arc<dyn ClientStorage>,
}

impl std::fmt::Debug for PreOrderBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreOrderBook")
            .field("orders", &self.orders.len())
            .finish_non_exhaustive()
    }
}

impl PreOrderBook {
    #[must_use]
    pub fn restore(storage: Arc<dyn ClientStorage>) -> Self {
        let orders = load_json(storage.as_ref(), PREORDERS_STORAGE_KEY).unwrap_or_default();
        Self { orders, storage }
    }

    /// Reserve items from `collection`.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown color or size, a zero quantity, or if
    /// the book cannot be persisted.
    #[instrument(skip(self, collection))]
    pub fn place(
        &mut self,
        collection: &NextCollection,
        form: &PreOrderForm,
        now: DateTime<Utc>,
    ) -> Result<PreOrder, PreOrderError> {
        let color: Color = form.color.parse()?;
        let size = collection
            .size(&form.size)
            .ok_or_else(|| PreOrderError::SizeUnavailable(form.size.trim().to_owned()))?
            .to_owned();
        if form.quantity == 0 {
            return Err(PreOrderError::InvalidQuantity);
        }

        let total = collection.unit_price.times(form.quantity);
        let order = PreOrder {
            id: PreOrderId::new(),
            collection: collection.name.clone(),
            color,
            size,
            quantity: form.quantity,
            unit_price: collection.unit_price,
            total,
            total_display: format_amount(total),
            ships_on: collection.ships_on,
            placed_at: now,
        };

        self.orders.push(order.clone());
        if let Err(e) = save_json(self.storage.as_ref(), PREORDERS_STORAGE_KEY, &self.orders) {
            self.orders.pop();
            return Err(e.into());
        }
        tracing::info!(preorder_id = %order.id, total = %order.total, "Pre-order confirmed");
        Ok(order)
    }

    #[must_use]
    pub fn orders(&self) -> &[PreOrder] {
        &self.orders
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn form(color: &str, size: &str, quantity: u32) -> PreOrderForm {
        PreOrderForm {
            color: color.to_string(),
            size: size.to_string(),
            quantity,
        }
    }

    #[test]
    fn test_collection_details() {
        let collection = NextCollection::current().unwrap();
        assert_eq!(collection.release_date.to_string(), "2025-02-01");
        assert_eq!(collection.ships_on.to_string(), "2025-02-05");
        assert_eq!(collection.unit_price_display, "$85.00");
        assert_eq!(collection.sizes, ["M", "L", "XL", "XXL"]);
        assert_eq!(collection.previews.len(), 2);
    }

    #[test]
    fn test_place_prices_by_quantity() {
        let collection = NextCollection::current().unwrap();
        let mut book = PreOrderBook::restore(Arc::new(MemoryStorage::new()));

        let order = book.place(&collection, &form("White", "xl", 3), Utc::now()).unwrap();
        assert_eq!(order.color, Color::White);
        assert_eq!(order.size, "XL");
        assert_eq!(order.total, Decimal::from(255));
        assert_eq!(order.total_display, "$255.00");
        assert_eq!(book.orders().len(), 1);
    }

    #[test]
    fn test_invalid_choices_are_rejected() {
        let collection = NextCollection::current().unwrap();
        let mut book = PreOrderBook::restore(Arc::new(MemoryStorage::new()));

        assert!(matches!(
            book.place(&collection, &form("grey", "M", 1), Utc::now()),
            Err(PreOrderError::InvalidColor(_))
        ));
        assert!(matches!(
            book.place(&collection, &form("black", "XS", 1), Utc::now()),
            Err(PreOrderError::SizeUnavailable(s)) if s == "XS"
        ));
        assert!(matches!(
            book.place(&collection, &form("black", "M", 0), Utc::now()),
            Err(PreOrderError::InvalidQuantity)
        ));
        assert!(book.orders().is_empty());
    }

    #[test]
    fn test_quantity_defaults_to_one() {
        let form: PreOrderForm =
            serde_json::from_value(serde_json::json!({ "color": "black", "size": "M" })).unwrap();
        assert_eq!(form.quantity, 1);
    }

    #[test]
    fn test_orders_survive_restart() {
        let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
        let collection = NextCollection::current().unwrap();

        let mut book = PreOrderBook::restore(Arc::clone(&storage));
        let order = book.place(&collection, &form("black", "M", 1), Utc::now()).unwrap();

        assert_eq!(PreOrderBook::restore(storage).orders(), &[order]);
    }
}
