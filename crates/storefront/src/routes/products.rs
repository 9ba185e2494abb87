//! Catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use bw_core::{Product, ProductId};
use serde::Deserialize;
use tracing::instrument;

use crate::catalog::ProductFilter;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Query parameters for the product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub color: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
}

/// Product listing.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = ProductFilter::from_query(
        query.search.as_deref(),
        query.color.as_deref(),
        query.price.as_deref(),
        query.category.as_deref(),
    )?;
    Ok(Json(state.catalog().list(&filter).await?))
}

/// Product detail.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    state
        .catalog()
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}
