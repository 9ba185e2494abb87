//! Integration tests for the B&W store.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bw-integration-tests
//! ```
//!
//! Both routers are driven in-process with `tower::ServiceExt::oneshot`: the
//! storefront over in-memory client storage with no simulated delays, the
//! admin app over [`MemoryBackend`].
//!
//! # Test Categories
//!
//! - `storefront_*` - Storefront API tests
//! - `admin_*` - Admin API tests

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use bw_admin::backend::MemoryBackend;
use bw_admin::models::Profile;
use bw_core::{ProfileId, Role, Uuid};
use bw_storefront::config::StorefrontConfig;
use bw_storefront::storage::{ClientStorage, MemoryStorage};
use serde_json::Value;
use tower::ServiceExt;

/// Status and decoded JSON body (or `Value::Null` for non-JSON bodies).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Send one request through `app`.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    TestResponse { status, body }
}

/// Build a request with an optional JSON body.
pub fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: &Router, uri: &str) -> TestResponse {
    send(app, json_request(Method::GET, uri, None)).await
}

pub async fn post(app: &Router, uri: &str, body: Option<Value>) -> TestResponse {
    send(app, json_request(Method::POST, uri, body)).await
}

// =============================================================================
// Storefront
// =============================================================================

/// Storefront config with the seeded catalog and no simulated delays.
#[must_use]
pub fn storefront_config() -> StorefrontConfig {
    StorefrontConfig {
        payment_delay: Duration::ZERO,
        verify_delay: Duration::ZERO,
        submit_delay: Duration::ZERO,
        verify_timeout: Duration::from_secs(1),
        backend: None,
        ..StorefrontConfig::default()
    }
}

/// Storefront router over fresh in-memory storage.
#[must_use]
pub fn storefront() -> Router {
    storefront_over(Arc::new(MemoryStorage::new()))
}

/// Storefront router over the given storage, for restart tests.
#[must_use]
pub fn storefront_over(storage: Arc<dyn ClientStorage>) -> Router {
    let state =
        bw_storefront::state::AppState::with_storage(storefront_config(), storage).unwrap();
    bw_storefront::app(state)
}

/// A shipping form that passes validation.
#[must_use]
pub fn valid_shipping() -> Value {
    serde_json::json!({
        "name": "Jane Smith",
        "email": "jane@example.com",
        "phone": "+1 555 0100",
        "address": "1 Main St",
        "city": "Springfield",
        "postal_code": "12345",
        "country": "US",
    })
}

// =============================================================================
// Admin
// =============================================================================

pub const ADMIN_TOKEN: &str = "admin-access-token";
pub const SHOPPER_TOKEN: &str = "shopper-access-token";

/// Admin router and the backend behind it.
pub struct AdminFixture {
    pub app: Router,
    pub backend: MemoryBackend,
}

/// Admin app with one admin and one regular user signed in.
#[must_use]
pub fn admin() -> AdminFixture {
    let backend = MemoryBackend::new("https://cdn.test/storage/v1/object/public/product-images");
    backend.add_session(
        ADMIN_TOKEN,
        profile(1, "admin@bw.example", Role::Admin),
    );
    backend.add_session(
        SHOPPER_TOKEN,
        profile(2, "shopper@bw.example", Role::User),
    );

    let state = bw_admin::state::AppState::in_memory(backend.clone());
    AdminFixture {
        app: bw_admin::app(state),
        backend,
    }
}

fn profile(n: u128, email: &str, role: Role) -> Profile {
    Profile {
        id: ProfileId::from_uuid(Uuid::from_u128(n)),
        email: Some(email.to_string()),
        full_name: None,
        role,
    }
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    const BOUNDARY: &'static str = "bw-test-boundary";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n",
                Self::BOUNDARY
            )
            .as_bytes(),
        );
        self
    }

    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n",
                Self::BOUNDARY
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// POST request carrying the form, optionally with a bearer token.
    #[must_use]
    pub fn into_request(mut self, uri: &str, token: Option<&str>) -> Request<Body> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", Self::BOUNDARY).as_bytes());
        let mut builder = Request::builder().method(Method::POST).uri(uri).header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", Self::BOUNDARY),
        );
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::from(self.body)).unwrap()
    }
}
