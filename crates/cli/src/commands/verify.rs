//! Order code verification.

use bw_storefront::verification::VerificationOutcome;
use tracing::{info, warn};

/// Verify an order code against the configured source.
///
/// # Errors
///
/// Returns an error for an empty or malformed code, a lookup that times out,
/// or a backend failure. An unknown code is not an error.
pub async fn verify(code: &str) -> Result<(), Box<dyn std::error::Error>> {
    let state = super::storefront()?;

    match state.verifier().verify(code).await? {
        VerificationOutcome::Verified(record) => {
            info!(
                sku = %record.sku,
                product = %record.product.name,
                color = %record.product.color,
                purchaser = %record.purchaser,
                purchase_date = %record.purchase_date,
                "Authentic purchase"
            );
        }
        VerificationOutcome::NotFound => {
            warn!(code, "No purchase found for this code");
        }
    }

    Ok(())
}
