//! Integration tests for the checkout flow and SKU verification.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use bw_integration_tests::{get, post, storefront, valid_shipping};
use bw_storefront::catalog::{ESSENTIAL_BLACK_TEE, PURE_WHITE_TEE};
use serde_json::json;

async fn fill_cart(app: &axum::Router) {
    post(
        app,
        "/api/cart/items",
        Some(json!({ "product_id": ESSENTIAL_BLACK_TEE.to_string(), "size": "M", "quantity": 2 })),
    )
    .await;
    post(
        app,
        "/api/cart/items",
        Some(json!({ "product_id": PURE_WHITE_TEE.to_string(), "size": "L" })),
    )
    .await;
}

fn is_order_code(code: &str) -> bool {
    code.len() == 8 && code.starts_with("BW") && code[2..].chars().all(|c| c.is_ascii_digit())
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_full_checkout_produces_verifiable_order() {
    let app = storefront();
    fill_cart(&app).await;

    let shipping = post(&app, "/api/checkout/shipping", Some(valid_shipping())).await;
    assert_eq!(shipping.status, StatusCode::OK);
    assert_eq!(shipping.body["checkout"]["step"], "collecting_payment");

    let order = post(&app, "/api/checkout/complete", None).await;
    assert_eq!(order.status, StatusCode::OK);
    let sku = order.body["sku"].as_str().unwrap().to_string();
    assert!(is_order_code(&sku), "unexpected order code {sku}");
    assert_eq!(order.body["status"], "confirmed");
    assert_eq!(order.body["items"].as_array().unwrap().len(), 2);
    assert_eq!(order.body["total"], "255");

    // Cart is emptied and the checkout shows the order
    let cart = get(&app, "/api/cart").await;
    assert!(cart.body["items"].as_array().unwrap().is_empty());
    let checkout = get(&app, "/api/checkout").await;
    assert_eq!(checkout.body["checkout"]["step"], "completed");
    assert_eq!(checkout.body["checkout"]["order"]["sku"], sku.as_str());

    // The new code verifies, in any case
    let verified = get(&app, &format!("/api/verify/{}", sku.to_lowercase())).await;
    assert_eq!(verified.status, StatusCode::OK);
    assert_eq!(verified.body["valid"], true);
    assert_eq!(verified.body["purchaser"], "Jane Smith");
}

#[tokio::test]
async fn test_cash_on_delivery_order_is_pending() {
    let app = storefront();
    fill_cart(&app).await;
    post(&app, "/api/checkout/shipping", Some(valid_shipping())).await;

    let method = post(
        &app,
        "/api/checkout/payment-method",
        Some(json!({ "method": "cod" })),
    )
    .await;
    assert_eq!(method.status, StatusCode::OK);

    let order = post(&app, "/api/checkout/complete", None).await;
    assert_eq!(order.body["payment_method"], "cash_on_delivery");
    assert_eq!(order.body["status"], "pending");
}

#[tokio::test]
async fn test_empty_cart_cannot_pay() {
    let app = storefront();
    post(&app, "/api/checkout/shipping", Some(valid_shipping())).await;

    let response = post(&app, "/api/checkout/complete", None).await;
    assert_eq!(response.status, StatusCode::CONFLICT);

    let checkout = get(&app, "/api/checkout").await;
    assert_eq!(checkout.body["checkout"]["step"], "collecting_payment");
}

#[tokio::test]
async fn test_invalid_shipping_lists_fields() {
    let app = storefront();
    fill_cart(&app).await;

    let mut form = valid_shipping();
    form["city"] = json!("  ");
    form["email"] = json!("not-an-email");

    let response = post(&app, "/api/checkout/shipping", Some(form)).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["missing"], json!(["city"]));
    assert_eq!(response.body["invalid_email"], true);

    let checkout = get(&app, "/api/checkout").await;
    assert_eq!(checkout.body["checkout"]["step"], "collecting_shipping");
}

#[tokio::test]
async fn test_out_of_order_actions_conflict() {
    let app = storefront();
    fill_cart(&app).await;

    // Paying before shipping
    let early = post(&app, "/api/checkout/complete", None).await;
    assert_eq!(early.status, StatusCode::CONFLICT);

    // Retry without a failed payment
    let retry = post(&app, "/api/checkout/retry", None).await;
    assert_eq!(retry.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_back_and_restart() {
    let app = storefront();
    fill_cart(&app).await;
    post(&app, "/api/checkout/shipping", Some(valid_shipping())).await;

    let back = post(&app, "/api/checkout/back", None).await;
    assert_eq!(back.status, StatusCode::OK);
    assert_eq!(back.body["checkout"]["step"], "collecting_shipping");

    post(&app, "/api/checkout/shipping", Some(valid_shipping())).await;
    post(&app, "/api/checkout/complete", None).await;

    let restarted = post(&app, "/api/checkout/restart", None).await;
    assert_eq!(restarted.status, StatusCode::OK);
    assert_eq!(restarted.body["checkout"]["step"], "collecting_shipping");
}

// =============================================================================
// Verification
// =============================================================================

#[tokio::test]
async fn test_fixture_codes_verify_case_insensitively() {
    let app = storefront();

    let upper = get(&app, "/api/verify/BW001234").await;
    assert_eq!(upper.body["valid"], true);
    assert_eq!(upper.body["product"]["name"], "Essential Black Tee");
    assert_eq!(upper.body["purchaser"], "John Doe");
    assert_eq!(upper.body["purchase_date"], "2024-12-15");

    let lower = get(&app, "/api/verify/bww001").await;
    assert_eq!(lower.body["valid"], true);
    assert_eq!(lower.body["product"]["name"], "Pure White Tee");
    assert_eq!(lower.body["purchaser"], "Jane Smith");
}

#[tokio::test]
async fn test_unknown_code_is_not_an_error() {
    let app = storefront();

    let response = get(&app, "/api/verify/BW999999").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, json!({ "valid": false }));
}

#[tokio::test]
async fn test_blank_code_is_rejected() {
    let app = storefront();
    let response = get(&app, "/api/verify/%20%20").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
