//! Cart engine.
//!
//! Holds the shopper's line items, merges duplicates by `(product, size)`,
//! derives totals on demand and persists a full snapshot to client storage
//! after every mutation.
//!
//! # Persistence
//!
//! The snapshot is a JSON array of [`CartLineItem`] stored under
//! [`CART_STORAGE_KEY`]. Mutations update the in-memory cart first and then
//! write; if the write fails the error is returned but the in-memory state
//! keeps the change, so the shopper never sees an edit silently reverted.

use std::sync::Arc;

use bw_core::{CartLineItem, Color, LineItemId, Price, Product, ProductId, format_amount};
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::storage::{ClientStorage, StorageError, load_json, save_json};

/// Storage key holding the cart snapshot.
pub const CART_STORAGE_KEY: &str = "cart";

/// Input for [`CartEngine::add_item`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLineItem {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: u32,
    pub unit_price: Price,
    pub name: String,
    pub color: Color,
    pub image: Option<String>,
}

impl NewLineItem {
    /// Build a line from a catalog product, snapshotting its current price.
    #[must_use]
    pub fn from_product(product: &Product, size: impl Into<String>, quantity: u32) -> Self {
        Self {
            product_id: product.id,
            size: size.into(),
            quantity,
            unit_price: product.price,
            name: product.name.clone(),
            color: product.color,
            image: product.primary_image().map(str::to_owned),
        }
    }

    /// Like [`Self::from_product`], but only for a size the product is
    /// offered in and while it is in stock.
    ///
    /// # Errors
    ///
    /// Returns an [`AddItemError`] naming why the product cannot be added.
    pub fn available(product: &Product, size: &str, quantity: u32) -> Result<Self, AddItemError> {
        let size = size.trim();
        if size.is_empty() {
            return Err(AddItemError::MissingSize);
        }
        // Store the catalog's spelling so "l" and "L" land on the same line
        let size = if product.sizes.is_empty() {
            size.to_ascii_uppercase()
        } else {
            product
                .offered_size(size)
                .map(str::to_owned)
                .ok_or_else(|| AddItemError::SizeUnavailable {
                    product: product.name.clone(),
                    size: size.to_owned(),
                })?
        };
        if !product.in_stock() {
            return Err(AddItemError::OutOfStock(product.name.clone()));
        }
        Ok(Self::from_product(product, size, quantity))
    }
}

/// Why a product cannot go into the cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddItemError {
    #[error("Please select a size")]
    MissingSize,

    #[error("{product} is not available in size {size}")]
    SizeUnavailable { product: String, size: String },

    #[error("{0} is out of stock")]
    OutOfStock(String),
}

/// Read-only view of the cart with its derived values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSnapshot {
    pub items: Vec<CartLineItem>,
    pub total: Decimal,
    pub total_display: String,
    pub item_count: u32,
}

/// The shopper's cart.
pub struct CartEngine {
    items: Vec<CartLineItem>,
    storage: Arc<dyn ClientStorage>,
}

impl std::fmt::Debug for CartEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartEngine")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl CartEngine {
    /// Restore the cart from storage, or start empty if nothing usable is stored.
    #[must_use]
    pub fn restore(storage: Arc<dyn ClientStorage>) -> Self {
        let items: Vec<CartLineItem> =
            load_json(storage.as_ref(), CART_STORAGE_KEY).unwrap_or_default();
        tracing::debug!(items = items.len(), "Cart restored");
        Self { items, storage }
    }

    /// Add an item, merging with an existing line for the same product and size.
    ///
    /// Returns the ID of the line that now holds the item. Adding a zero
    /// quantity leaves the cart unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted.
    #[instrument(skip(self, item), fields(product_id = %item.product_id, size = %item.size, quantity = item.quantity))]
    pub fn add_item(&mut self, item: NewLineItem) -> Result<Option<LineItemId>, StorageError> {
        if item.quantity == 0 {
            return Ok(None);
        }

        let id = if let Some(existing) = self
            .items
            .iter_mut()
            .find(|line| line.is_same_variant(item.product_id, &item.size))
        {
            existing.quantity = existing.quantity.saturating_add(item.quantity);
            existing.id
        } else {
            let id = LineItemId::new();
            self.items.push(CartLineItem {
                id,
                product_id: item.product_id,
                size: item.size,
                quantity: item.quantity,
                unit_price: item.unit_price,
                name: item.name,
                color: item.color,
                image: item.image,
            });
            id
        };

        self.persist()?;
        Ok(Some(id))
    }

    /// Set a line's quantity. Zero or negative removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &mut self,
        line_id: LineItemId,
        new_quantity: i64,
    ) -> Result<(), StorageError> {
        if new_quantity <= 0 {
            return self.remove_item(line_id);
        }

        let quantity = u32::try_from(new_quantity).unwrap_or(u32::MAX);
        if let Some(line) = self.items.iter_mut().find(|line| line.id == line_id) {
            line.quantity = quantity;
        }
        self.persist()
    }

    /// Remove a line. Unknown IDs are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted.
    #[instrument(skip(self))]
    pub fn remove_item(&mut self, line_id: LineItemId) -> Result<(), StorageError> {
        self.items.retain(|line| line.id != line_id);
        self.persist()
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be persisted.
    #[instrument(skip(self))]
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        self.persist()
    }

    /// Sum of `unit_price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartLineItem::line_total).sum()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |count, line| count.saturating_add(line.quantity))
    }

    /// Current lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Look up a line by ID.
    #[must_use]
    pub fn get(&self, line_id: LineItemId) -> Option<&CartLineItem> {
        self.items.iter().find(|line| line.id == line_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Copy of the cart with derived totals, for rendering.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        let total = self.total();
        CartSnapshot {
            items: self.items.clone(),
            total,
            total_display: format_amount(total),
            item_count: self.item_count(),
        }
    }

    fn persist(&self) -> Result<(), StorageError> {
        save_json(self.storage.as_ref(), CART_STORAGE_KEY, &self.items)
    }
}
