//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health          - Health check
//! GET    /api/me          - Signed-in admin profile
//! POST   /api/products    - Create a product (multipart form with images)
//! ```

pub mod products;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::middleware::RequireAdmin;
use crate::models::Profile;
use crate::state::AppState;

/// Largest accepted product form, images included.
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Create all routes for admin.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/me", get(me))
        .route(
            "/api/products",
            post(products::create).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The signed-in admin.
async fn me(RequireAdmin(profile): RequireAdmin) -> Json<Profile> {
    Json(profile)
}
