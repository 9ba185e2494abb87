//! Return request handlers.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use tracing::instrument;

use crate::error::{Result, add_breadcrumb};
use crate::returns::{ReturnError, ReturnForm, ReturnRequest};
use crate::state::AppState;
use crate::verification::VerificationOutcome;

/// Return requests submitted so far.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Json<Vec<ReturnRequest>> {
    Json(state.session().with(|s| s.returns.requests().to_vec()))
}

/// Submit a return or exchange for an order code.
#[instrument(skip(state, form))]
pub async fn submit(
    State(state): State<AppState>,
    Json(form): Json<ReturnForm>,
) -> Result<(StatusCode, Json<ReturnRequest>)> {
    let draft = form.validate().map_err(ReturnError::from)?;

    let record = match state.verifier().verify(draft.sku.as_str()).await? {
        VerificationOutcome::Verified(record) => record,
        VerificationOutcome::NotFound => return Err(ReturnError::UnknownOrder(draft.sku).into()),
    };

    tokio::time::sleep(state.config().submit_delay).await;
    let request = state
        .session()
        .with(|s| s.returns.submit(draft, &record, Utc::now()))?;

    add_breadcrumb(
        "returns",
        "Return requested",
        Some(&[("sku", request.sku.as_str())]),
    );
    Ok((StatusCode::CREATED, Json(request)))
}
