//! Checkout route handlers.

use axum::{Json, extract::State};
use bw_core::{Order, PaymentMethod};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::cart::CartSnapshot;
use crate::checkout::{Checkout, ShippingForm};
use crate::error::{Result, add_breadcrumb};
use crate::state::AppState;

/// Checkout step together with the cart being checked out.
#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub checkout: Checkout,
    pub cart: CartSnapshot,
}

/// Payment method choice.
#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub method: PaymentMethod,
}

fn view(state: &AppState) -> CheckoutView {
    state.session().with(|s| CheckoutView {
        checkout: s.checkout.clone(),
        cart: s.cart.snapshot(),
    })
}

/// Current checkout state.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<CheckoutView> {
    Json(view(&state))
}

/// Submit the shipping form.
#[instrument(skip(state, form))]
pub async fn shipping(
    State(state): State<AppState>,
    Json(form): Json<ShippingForm>,
) -> Result<Json<CheckoutView>> {
    state.session().with(|s| s.checkout.submit_shipping(&form))?;
    Ok(Json(view(&state)))
}

/// Return to the shipping step.
#[instrument(skip(state))]
pub async fn back(State(state): State<AppState>) -> Result<Json<CheckoutView>> {
    state.session().with(|s| s.checkout.back())?;
    Ok(Json(view(&state)))
}

/// Choose card or cash on delivery.
#[instrument(skip(state))]
pub async fn payment_method(
    State(state): State<AppState>,
    Json(request): Json<PaymentMethodRequest>,
) -> Result<Json<CheckoutView>> {
    state
        .session()
        .with(|s| s.checkout.select_payment_method(request.method))?;
    Ok(Json(view(&state)))
}

/// Pay and place the order.
///
/// Holds the request open for the gateway's settlement delay. If the client
/// disconnects first, the checkout returns to the payment step.
#[instrument(skip(state))]
pub async fn complete(State(state): State<AppState>) -> Result<Json<Order>> {
    let order = state.session().complete_payment(state.gateway()).await?;
    state.record_order(&order);
    add_breadcrumb(
        "checkout",
        "Order completed",
        Some(&[("sku", order.sku.as_str())]),
    );
    Ok(Json(order))
}

/// Return to the payment step after a decline.
#[instrument(skip(state))]
pub async fn retry(State(state): State<AppState>) -> Result<Json<CheckoutView>> {
    state.session().with(|s| s.checkout.retry())?;
    Ok(Json(view(&state)))
}

/// Abandon payment and go back to shipping.
#[instrument(skip(state))]
pub async fn cancel(State(state): State<AppState>) -> Result<Json<CheckoutView>> {
    state.session().with(|s| s.checkout.cancel())?;
    Ok(Json(view(&state)))
}

/// Start a fresh checkout.
#[instrument(skip(state))]
pub async fn restart(State(state): State<AppState>) -> Result<Json<CheckoutView>> {
    state.session().with(|s| s.checkout.restart())?;
    Ok(Json(view(&state)))
}
