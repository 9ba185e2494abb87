//! CLI command implementations.

pub mod admin;
pub mod cart;
pub mod catalog;
pub mod verify;

use bw_storefront::config::StorefrontConfig;
use bw_storefront::state::AppState;

/// Storefront state from the environment, with the cart persisted where the
/// server keeps it.
fn storefront() -> Result<AppState, Box<dyn std::error::Error>> {
    let config = StorefrontConfig::from_env()?;
    Ok(AppState::new(config)?)
}

/// Render a value as pretty JSON for log output.
fn pretty<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
