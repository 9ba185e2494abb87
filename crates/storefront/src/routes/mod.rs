//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                             - Health check
//!
//! # Catalog
//! GET    /api/products                       - Product listing (?search=&color=&price=&category=)
//! GET    /api/products/{id}                  - Product detail
//!
//! # Cart
//! GET    /api/cart                           - Cart with total
//! DELETE /api/cart                           - Clear cart
//! POST   /api/cart/items                     - Add item
//! PATCH  /api/cart/items/{id}                - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{id}                - Remove item
//!
//! # Favorites
//! GET    /api/favorites                      - Favorite products
//! POST   /api/favorites/{product_id}/toggle  - Toggle favorite
//!
//! # Checkout
//! GET    /api/checkout                       - Current step
//! POST   /api/checkout/shipping              - Submit shipping form
//! POST   /api/checkout/back                  - Back to shipping
//! POST   /api/checkout/payment-method        - Choose payment method
//! POST   /api/checkout/complete              - Pay and place the order
//! POST   /api/checkout/retry                 - Retry after a decline
//! POST   /api/checkout/cancel                - Abandon payment
//! POST   /api/checkout/restart               - Start a new checkout
//!
//! # Verification
//! GET    /api/verify/{sku}                   - Verify an order code
//!
//! # Returns
//! GET    /api/returns                        - Submitted return requests
//! POST   /api/returns                        - Request a return or exchange
//!
//! # Pre-orders
//! GET    /api/preorders/collection           - Next collection details
//! GET    /api/preorders                      - Placed pre-orders
//! POST   /api/preorders                      - Place a pre-order
//! ```

pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod preorders;
pub mod products;
pub mod returns;
pub mod verify;

use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::state::AppState;

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route("/{product_id}/toggle", post(favorites::toggle))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/back", post(checkout::back))
        .route("/payment-method", post(checkout::payment_method))
        .route("/complete", post(checkout::complete))
        .route("/retry", post(checkout::retry))
        .route("/cancel", post(checkout::cancel))
        .route("/restart", post(checkout::restart))
}

/// Create the returns routes router.
pub fn return_routes() -> Router<AppState> {
    Router::new().route("/", get(returns::index).post(returns::submit))
}

/// Create the pre-order routes router.
pub fn preorder_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(preorders::index).post(preorders::place))
        .route("/collection", get(preorders::collection))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/products", product_routes())
        .nest("/api/cart", cart_routes())
        .nest("/api/favorites", favorite_routes())
        .nest("/api/checkout", checkout_routes())
        .route("/api/verify/{sku}", get(verify::verify))
        .nest("/api/returns", return_routes())
        .nest("/api/preorders", preorder_routes())
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}
