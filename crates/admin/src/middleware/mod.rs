//! HTTP middleware for admin.
//!
//! Layers are applied in [`crate::app`]; request guards live here as
//! extractors.

pub mod auth;

pub use auth::{AdminAuthRejection, IdentityProvider, RequireAdmin};
