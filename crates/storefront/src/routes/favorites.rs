//! Favorites route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use bw_core::{Product, ProductId};
use serde::Serialize;
use tracing::instrument;

use crate::catalog::ProductFilter;
use crate::error::Result;
use crate::state::AppState;

/// Favorites listing.
#[derive(Debug, Serialize)]
pub struct FavoritesView {
    pub ids: Vec<ProductId>,
    /// Favorited products still in the catalog, in favorite order.
    pub products: Vec<Product>,
}

/// Toggle result.
#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub product_id: ProductId,
    pub favorite: bool,
}

/// Favorite products.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<FavoritesView>> {
    let ids = state.session().with(|s| s.favorites.ids().to_vec());
    let catalog = state.catalog().list(&ProductFilter::default()).await?;
    let products = ids
        .iter()
        .filter_map(|id| catalog.iter().find(|p| p.id == *id).cloned())
        .collect();
    Ok(Json(FavoritesView { ids, products }))
}

/// Flip a product's favorite membership.
#[instrument(skip(state))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<ToggleResponse>> {
    let favorite = state.session().with(|s| s.favorites.toggle(product_id))?;
    Ok(Json(ToggleResponse {
        product_id,
        favorite,
    }))
}
