//! Pre-order handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;

use crate::error::Result;
use crate::preorder::{NextCollection, PreOrder, PreOrderForm};
use crate::state::AppState;

/// The collection open for pre-order.
#[instrument]
pub async fn collection() -> Result<Json<NextCollection>> {
    Ok(Json(NextCollection::current()?))
}

/// Pre-orders placed so far.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<PreOrder>> {
    Json(state.session().with(|s| s.preorders.orders().to_vec()))
}

/// Reserve items from the next collection.
#[instrument(skip(state))]
pub async fn place(
    State(state): State<AppState>,
    Json(form): Json<PreOrderForm>,
) -> Result<(StatusCode, Json<PreOrder>)> {
    let collection = NextCollection::current()?;
    tokio::time::sleep(state.config().submit_delay).await;
    let order = state
        .session()
        .with(|s| s.preorders.place(&collection, &form, Utc::now()))?;
    Ok((StatusCode::CREATED, Json(order)))
}
