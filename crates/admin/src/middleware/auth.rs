//! Authentication extractors for admin.
//!
//! The admin API is stateless: every request carries the caller's access
//! token as `Authorization: Bearer <token>`. The token is resolved to a
//! profile through an [`IdentityProvider`] and only `admin` profiles get in.

use std::future::Future;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::backend::BackendError;
use crate::models::Profile;
use crate::state::AppState;

/// Resolves access tokens to profiles.
pub trait IdentityProvider: Send + Sync {
    /// The profile behind `token`, or `None` if the token is not valid.
    fn profile_for_token(
        &self,
        token: &str,
    ) -> impl Future<Output = Result<Option<Profile>, BackendError>> + Send;
}

/// Extractor that requires an admin profile.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAdmin(admin): RequireAdmin) -> impl IntoResponse {
///     format!("Hello, {}!", admin.email.unwrap_or_default())
/// }
/// ```
pub struct RequireAdmin(pub Profile);

/// Why a request was turned away.
#[derive(Debug)]
pub enum AdminAuthRejection {
    /// No token, or a token the auth service does not accept.
    Unauthorized,
    /// Signed in but not an admin.
    Forbidden,
    /// The auth service could not be reached.
    Unavailable,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please sign in" })),
            )
                .into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({ "error": "Access denied" })),
            )
                .into_response(),
            Self::Unavailable => (
                StatusCode::BAD_GATEWAY,
                Json(json!({ "error": "External service error" })),
            )
                .into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AdminAuthRejection::Unauthorized)?;

        let profile = state
            .backend()
            .profile_for_token(token)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to resolve access token");
                AdminAuthRejection::Unavailable
            })?
            .ok_or(AdminAuthRejection::Unauthorized)?;

        if !profile.is_admin() {
            tracing::warn!(profile_id = %profile.id, "Non-admin denied");
            return Err(AdminAuthRejection::Forbidden);
        }

        sentry::configure_scope(|scope| {
            scope.set_user(Some(sentry::User {
                id: Some(profile.id.to_string()),
                email: profile.email.clone(),
                ..Default::default()
            }));
        });

        Ok(Self(profile))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
