//! Integration tests for the storefront catalog, cart and favorites API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use bw_integration_tests::{get, json_request, post, send, storefront, storefront_over};
use bw_storefront::catalog::{ESSENTIAL_BLACK_TEE, MIDNIGHT_BLACK_PREMIUM, PURE_WHITE_TEE};
use bw_storefront::storage::{ClientStorage, MemoryStorage};
use serde_json::json;

fn add_body(product: impl ToString, size: &str, quantity: u32) -> serde_json::Value {
    json!({ "product_id": product.to_string(), "size": size, "quantity": quantity })
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = storefront();
    let response = get(&app, "/health").await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_product_listing_filters() {
    let app = storefront();

    let all = get(&app, "/api/products").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().unwrap().len(), 3);

    let white = get(&app, "/api/products?color=white").await;
    let names: Vec<&str> = white
        .body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Pure White Tee"]);

    let premium = get(&app, "/api/products?price=over-100").await;
    assert!(premium.body.as_array().unwrap().is_empty());

    let search = get(&app, "/api/products?search=MIDNIGHT&color=all").await;
    assert_eq!(search.body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_filter_is_rejected() {
    let app = storefront();
    let response = get(&app, "/api/products?color=grey").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_product_detail_and_not_found() {
    let app = storefront();

    let found = get(&app, &format!("/api/products/{PURE_WHITE_TEE}")).await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["color"], "white");

    let missing = get(
        &app,
        "/api/products/00000000-0000-4000-8000-000000000000",
    )
    .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Cart
// =============================================================================

#[tokio::test]
async fn test_adding_same_variant_merges() {
    let app = storefront();

    post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "M", 1))).await;
    let cart = post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "M", 2))).await;

    assert_eq!(cart.status, StatusCode::OK);
    assert_eq!(cart.body["items"].as_array().unwrap().len(), 1);
    assert_eq!(cart.body["items"][0]["quantity"], 3);
    assert_eq!(cart.body["item_count"], 3);
    assert_eq!(cart.body["total_display"], "$255.00");
}

#[tokio::test]
async fn test_different_sizes_are_separate_lines() {
    let app = storefront();

    post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "M", 1))).await;
    post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "XL", 1))).await;
    let cart = post(&app, "/api/cart/items", Some(add_body(PURE_WHITE_TEE, "M", 1))).await;

    assert_eq!(cart.body["items"].as_array().unwrap().len(), 3);
    assert_eq!(cart.body["total_display"], "$255.00");
}

#[tokio::test]
async fn test_update_to_zero_removes_line() {
    let app = storefront();

    let cart = post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "L", 2))).await;
    let line_id = cart.body["items"][0]["id"].as_str().unwrap().to_string();

    let updated = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/api/cart/items/{line_id}"),
            Some(json!({ "quantity": 5 })),
        ),
    )
    .await;
    assert_eq!(updated.body["items"][0]["quantity"], 5);

    let removed = send(
        &app,
        json_request(
            Method::PATCH,
            &format!("/api/cart/items/{line_id}"),
            Some(json!({ "quantity": -1 })),
        ),
    )
    .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert!(removed.body["items"].as_array().unwrap().is_empty());
    assert_eq!(removed.body["total_display"], "$0.00");
}

#[tokio::test]
async fn test_remove_and_clear() {
    let app = storefront();

    post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "M", 1))).await;
    let cart = post(&app, "/api/cart/items", Some(add_body(PURE_WHITE_TEE, "L", 1))).await;
    let first = cart.body["items"][0]["id"].as_str().unwrap().to_string();

    let after_remove = send(
        &app,
        json_request(Method::DELETE, &format!("/api/cart/items/{first}"), None),
    )
    .await;
    assert_eq!(after_remove.body["items"].as_array().unwrap().len(), 1);

    let cleared = send(&app, json_request(Method::DELETE, "/api/cart", None)).await;
    assert!(cleared.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_add_rejects_unavailable_products() {
    let app = storefront();

    let sold_out = post(
        &app,
        "/api/cart/items",
        Some(add_body(MIDNIGHT_BLACK_PREMIUM, "M", 1)),
    )
    .await;
    assert_eq!(sold_out.status, StatusCode::BAD_REQUEST);
    assert!(sold_out.body["error"].as_str().unwrap().contains("out of stock"));

    let no_size = post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, " ", 1))).await;
    assert_eq!(no_size.status, StatusCode::BAD_REQUEST);

    let wrong_size = post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "XS", 1))).await;
    assert_eq!(wrong_size.status, StatusCode::BAD_REQUEST);

    let cart = get(&app, "/api/cart").await;
    assert!(cart.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());

    let app = storefront_over(Arc::clone(&storage));
    post(&app, "/api/cart/items", Some(add_body(ESSENTIAL_BLACK_TEE, "M", 2))).await;
    post(&app, &format!("/api/favorites/{PURE_WHITE_TEE}/toggle"), None).await;
    let before = get(&app, "/api/cart").await;

    let restarted = storefront_over(storage);
    let after = get(&restarted, "/api/cart").await;
    assert_eq!(after.body, before.body);

    let favorites = get(&restarted, "/api/favorites").await;
    assert_eq!(favorites.body["ids"], json!([PURE_WHITE_TEE.to_string()]));
}

// =============================================================================
// Favorites
// =============================================================================

#[tokio::test]
async fn test_toggle_twice_restores_favorites() {
    let app = storefront();
    let uri = format!("/api/favorites/{ESSENTIAL_BLACK_TEE}/toggle");

    let on = post(&app, &uri, None).await;
    assert_eq!(on.body["favorite"], true);

    let listed = get(&app, "/api/favorites").await;
    assert_eq!(listed.body["products"].as_array().unwrap().len(), 1);
    assert_eq!(listed.body["products"][0]["name"], "Essential Black Tee");

    let off = post(&app, &uri, None).await;
    assert_eq!(off.body["favorite"], false);

    let empty = get(&app, "/api/favorites").await;
    assert!(empty.body["ids"].as_array().unwrap().is_empty());
}
