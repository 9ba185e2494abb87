//! Cart route handlers.
//!
//! Every handler answers with the full cart snapshot so the client can
//! re-render lines, total and badge count from one response.

use axum::{
    Json,
    extract::{Path, State},
};
use bw_core::{LineItemId, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::cart::{CartSnapshot, NewLineItem};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::state::AppState;

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    pub size: String,
    pub quantity: Option<u32>,
}

/// Quantity update request body. Zero or negative removes the line.
#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

/// Current cart.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CartSnapshot> {
    Json(state.session().with(|s| s.cart.snapshot()))
}

/// Add a product in a size.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<CartSnapshot>> {
    let product = state
        .catalog()
        .get(request.product_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", request.product_id)))?;

    let item = NewLineItem::available(&product, &request.size, request.quantity.unwrap_or(1))?;
    let size = item.size.clone();
    let snapshot = state.session().with(|s| -> Result<CartSnapshot> {
        let cart = s.cart_mut()?;
        cart.add_item(item)?;
        Ok(cart.snapshot())
    })?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product", product.name.as_str()), ("size", size.as_str())]),
    );
    Ok(Json(snapshot))
}

/// Set a line's quantity.
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<LineItemId>,
    Json(request): Json<UpdateQuantityRequest>,
) -> Result<Json<CartSnapshot>> {
    state.session().with(|s| -> Result<Json<CartSnapshot>> {
        let cart = s.cart_mut()?;
        cart.update_quantity(id, request.quantity)?;
        Ok(Json(cart.snapshot()))
    })
}

/// Remove a line.
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<LineItemId>,
) -> Result<Json<CartSnapshot>> {
    state.session().with(|s| -> Result<Json<CartSnapshot>> {
        let cart = s.cart_mut()?;
        cart.remove_item(id)?;
        Ok(Json(cart.snapshot()))
    })
}

/// Empty the cart.
#[instrument(skip(state))]
pub async fn clear(State(state): State<AppState>) -> Result<Json<CartSnapshot>> {
    state.session().with(|s| -> Result<Json<CartSnapshot>> {
        let cart = s.cart_mut()?;
        cart.clear()?;
        Ok(Json(cart.snapshot()))
    })
}
