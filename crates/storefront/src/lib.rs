//! B&W Storefront library.
//!
//! Shopper-facing engines (cart, favorites, checkout, SKU verification,
//! returns, pre-orders) and the JSON HTTP API over them. Exposed as a library so the engines can be
//! tested directly and driven from the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod favorites;
pub mod preorder;
pub mod returns;
pub mod routes;
pub mod session;
pub mod state;
pub mod storage;
pub mod verification;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the storefront router with tracing and CORS applied.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// CORS for browser clients served from another local origin.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|o| o.starts_with("http://localhost") || o.starts_with("http://127.0.0.1"))
        }))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}
