//! SKU verification handler.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::Result;
use crate::state::AppState;
use crate::verification::VerificationOutcome;

/// Verify an order code. Unknown codes answer `{"valid": false}` with 200.
#[instrument(skip(state))]
pub async fn verify(
    State(state): State<AppState>,
    Path(sku): Path<String>,
) -> Result<Json<VerificationOutcome>> {
    Ok(Json(state.verifier().verify(&sku).await?))
}
