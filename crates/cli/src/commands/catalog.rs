//! Catalog browsing.

use bw_core::ProductId;
use bw_storefront::catalog::ProductFilter;
use tracing::info;

/// List products matching the given filters.
///
/// # Errors
///
/// Returns an error for an unknown filter value or a backend failure.
pub async fn list(
    search: Option<&str>,
    color: Option<&str>,
    price: Option<&str>,
    category: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = ProductFilter::from_query(search, color, price, category)?;
    let state = super::storefront()?;

    let products = state.catalog().list(&filter).await?;
    info!(count = products.len(), "Products");
    for product in &products {
        info!(
            id = %product.id,
            price = %product.price,
            color = %product.color,
            stock = product.stock,
            "{}",
            product.name
        );
    }

    Ok(())
}

/// Show one product in full.
///
/// # Errors
///
/// Returns an error for a malformed ID, an unknown product or a backend failure.
pub async fn show(id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let id: ProductId = id.parse()?;
    let state = super::storefront()?;

    let product = state
        .catalog()
        .get(id)
        .await?
        .ok_or_else(|| format!("No product with ID {id}"))?;
    info!("{}", super::pretty(&product)?);

    Ok(())
}
