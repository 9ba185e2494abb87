//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`;
//! the body is always a JSON object with an `error` message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::backend::BackendError;
use crate::cart::AddItemError;
use crate::catalog::FilterParseError;
use crate::checkout::CheckoutError;
use crate::preorder::PreOrderError;
use crate::returns::{ReturnError, ReturnFormError};
use crate::session::CartLocked;
use crate::storage::StorageError;
use crate::verification::VerifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Hosted backend request failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Client storage could not be written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Checkout rejected the action.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// SKU verification failed (not the same as "not found").
    #[error(transparent)]
    Verify(#[from] VerifyError),

    /// Product cannot be added in the requested size.
    #[error(transparent)]
    Unavailable(#[from] AddItemError),

    /// Return request was not accepted.
    #[error(transparent)]
    Return(#[from] ReturnError),

    /// Pre-order was not placed.
    #[error(transparent)]
    PreOrder(#[from] PreOrderError),

    /// Cart edit attempted during payment.
    #[error(transparent)]
    CartLocked(#[from] CartLocked),

    /// Unrecognized listing filter.
    #[error(transparent)]
    Filter(#[from] FilterParseError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Storage(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Checkout(err) => match err {
                CheckoutError::InvalidTransition { .. } | CheckoutError::EmptyCart => {
                    StatusCode::CONFLICT
                }
                CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                CheckoutError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            },
            Self::Return(err) => match err {
                ReturnError::Form(_) => StatusCode::UNPROCESSABLE_ENTITY,
                ReturnError::UnknownOrder(_) => StatusCode::NOT_FOUND,
                ReturnError::WindowClosed { .. } | ReturnError::AlreadyRequested(_) => {
                    StatusCode::CONFLICT
                }
                ReturnError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PreOrder(err) => match err {
                PreOrderError::Storage(_) | PreOrderError::Pricing(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            Self::Verify(err) => match err {
                VerifyError::InvalidCode(_) => StatusCode::BAD_REQUEST,
                VerifyError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
                VerifyError::Transport(_) => StatusCode::BAD_GATEWAY,
            },
            Self::CartLocked(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Filter(_) | Self::Unavailable(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Backend(_)
                | Self::Storage(_)
                | Self::Internal(_)
                | Self::Return(ReturnError::Storage(_))
                | Self::PreOrder(PreOrderError::Storage(_) | PreOrderError::Pricing(_))
                | Self::Verify(VerifyError::Transport(_))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Storage(_)
            | Self::Internal(_)
            | Self::Return(ReturnError::Storage(_))
            | Self::PreOrder(PreOrderError::Storage(_) | PreOrderError::Pricing(_)) => {
                json!({ "error": "Internal server error" })
            }
            Self::Backend(_) | Self::Verify(VerifyError::Transport(_)) => {
                json!({ "error": "External service error" })
            }
            Self::Checkout(CheckoutError::Validation(err)) => json!({
                "error": "Please fill in all required shipping fields",
                "missing": err.missing,
                "invalid_email": err.invalid_email,
            }),
            Self::Return(ReturnError::Form(ReturnFormError::MissingFields(missing))) => json!({
                "error": self.to_string(),
                "missing": missing,
            }),
            _ => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a breadcrumb for shopper actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use bw_core::{ShippingField, SkuError};

    use super::*;
    use crate::checkout::ShippingValidationError;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            get_status(AppError::CartLocked(CartLocked)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CheckoutError::EmptyCart.into()),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_verification_failures_are_distinct() {
        assert_eq!(
            get_status(VerifyError::InvalidCode(SkuError::Empty).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(VerifyError::Timeout(Duration::from_secs(5)).into()),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[tokio::test]
    async fn test_validation_error_lists_fields() {
        let err: AppError = CheckoutError::Validation(ShippingValidationError {
            missing: vec![ShippingField::City, ShippingField::PostalCode],
            invalid_email: false,
        })
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["missing"], serde_json::json!(["city", "postal_code"]));
    }

    #[test]
    fn test_return_failures_map_to_statuses() {
        let sku = bw_core::Sku::parse("BW001234").unwrap();
        assert_eq!(
            get_status(ReturnError::UnknownOrder(sku.clone()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(ReturnError::AlreadyRequested(sku).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(ReturnError::Form(ReturnFormError::UnknownReason("meh".into())).into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            get_status(PreOrderError::InvalidQuantity.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_return_missing_fields_are_listed() {
        let err: AppError =
            ReturnError::Form(ReturnFormError::MissingFields(vec!["order_sku", "new_size"])).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["missing"], serde_json::json!(["order_sku", "new_size"]));
    }

    #[tokio::test]
    async fn test_preorder_storage_failure_is_redacted() {
        let err: AppError = PreOrderError::Storage(StorageError::Io(std::io::Error::other(
            "/home/shopper/.bw-store.json: disk full",
        )))
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal server error");
    }
}
