//! Core types for the B&W store.
//!
//! This module provides type-safe wrappers for the domain concepts shared by
//! the storefront and the admin panel.

pub mod email;
pub mod id;
pub mod order;
pub mod price;
pub mod product;
pub mod shipping;
pub mod sku;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use order::{CartLineItem, Order};
pub use price::{Price, PriceError, format_amount};
pub use product::{Color, ColorError, Product, ProductImage, slugify};
pub use shipping::{ShippingField, ShippingInfo};
pub use sku::{Sku, SkuError};
pub use status::*;
