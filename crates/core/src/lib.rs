//! B&W Core - Shared domain types.
//!
//! This crate provides the canonical data model used across all B&W components:
//! - `storefront` - Shopper-facing catalog, cart, checkout and verification
//! - `admin` - Role-gated product editor
//! - `cli` - Command-line tools for verification and catalog management
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP clients,
//! no storage. Engines that mutate these types live in the storefront and admin
//! crates.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, SKUs, products, shipping and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
