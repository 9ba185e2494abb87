//! Persisted cart operations.
//!
//! Works on the same storage file format as the storefront server. The server
//! reads that file only at startup and rewrites it on every change, so edit
//! the cart here while the server is stopped; a running server would
//! overwrite these changes on its next save.

use bw_core::{LineItemId, ProductId};
use bw_storefront::cart::{CartEngine, CartSnapshot, NewLineItem};
use bw_storefront::state::AppState;
use tracing::info;

fn report(snapshot: &CartSnapshot) {
    if snapshot.items.is_empty() {
        info!("Cart is empty");
        return;
    }
    for line in &snapshot.items {
        info!(
            line_id = %line.id,
            size = %line.size,
            quantity = line.quantity,
            unit_price = %line.unit_price,
            "{}",
            line.name
        );
    }
    info!(
        items = snapshot.item_count,
        total = %snapshot.total_display,
        "Cart total"
    );
}

fn edit(
    state: &AppState,
    f: impl FnOnce(&mut CartEngine) -> Result<(), Box<dyn std::error::Error>>,
) -> Result<CartSnapshot, Box<dyn std::error::Error>> {
    state.session().with(|s| -> Result<CartSnapshot, Box<dyn std::error::Error>> {
        let cart = s.cart_mut()?;
        f(cart)?;
        Ok(cart.snapshot())
    })
}

/// Show the cart.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
pub fn show() -> Result<(), Box<dyn std::error::Error>> {
    let state = super::storefront()?;
    report(&state.session().with(|s| s.cart.snapshot()));
    Ok(())
}

/// Add a product in a size.
///
/// # Errors
///
/// Returns an error for an unknown product, a size it is not offered in, a
/// sold-out product or a storage failure.
pub async fn add(product_id: &str, size: &str, quantity: u32) -> Result<(), Box<dyn std::error::Error>> {
    let product_id: ProductId = product_id.parse()?;
    let state = super::storefront()?;

    let product = state
        .catalog()
        .get(product_id)
        .await?
        .ok_or_else(|| format!("No product with ID {product_id}"))?;
    let item = NewLineItem::available(&product, size, quantity)?;

    let snapshot = edit(&state, |cart| {
        cart.add_item(item)?;
        Ok(())
    })?;
    report(&snapshot);
    Ok(())
}

/// Set a line's quantity. Zero or less removes the line.
///
/// # Errors
///
/// Returns an error for a malformed line ID or a storage failure.
pub fn set(line_id: &str, quantity: i64) -> Result<(), Box<dyn std::error::Error>> {
    let line_id: LineItemId = line_id.parse()?;
    let state = super::storefront()?;
    let snapshot = edit(&state, |cart| {
        cart.update_quantity(line_id, quantity)?;
        Ok(())
    })?;
    report(&snapshot);
    Ok(())
}

/// Remove a line.
///
/// # Errors
///
/// Returns an error for a malformed line ID or a storage failure.
pub fn remove(line_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let line_id: LineItemId = line_id.parse()?;
    let state = super::storefront()?;
    let snapshot = edit(&state, |cart| {
        cart.remove_item(line_id)?;
        Ok(())
    })?;
    report(&snapshot);
    Ok(())
}

/// Empty the cart.
///
/// # Errors
///
/// Returns an error on a storage failure.
pub fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let state = super::storefront()?;
    let snapshot = edit(&state, |cart| {
        cart.clear()?;
        Ok(())
    })?;
    report(&snapshot);
    Ok(())
}
