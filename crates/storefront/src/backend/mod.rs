//! Hosted backend read client.
//!
//! Talks to the PostgREST-style REST API of the hosted database with the
//! public (anon) key. Only reads are made from the storefront: catalog rows
//! and order lookups for verification. Catalog reads are cached with `moka`
//! (5-minute TTL).

mod cache;
pub mod rows;

use std::sync::Arc;
use std::time::Duration;

use bw_core::{Product, ProductId, Sku};
use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::config::BackendConfig;

use cache::{CacheKey, CacheValue};
use rows::{OrderRow, ProductRow};

/// Errors that can occur when talking to the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Request URL could not be built.
    #[error("invalid backend URL: {0}")]
    Url(#[from] url::ParseError),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),
}

// =============================================================================
// BackendClient
// =============================================================================

/// Read-only client for the hosted REST API.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    rest_base: Url,
    api_key: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl BackendClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the REST endpoint cannot be derived from the
    /// configured base URL.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                rest_base: rest_base(&config.url)?,
                api_key: config.anon_key.expose_secret().to_string(),
                cache,
            }),
        })
    }

    /// GET a table endpoint and decode the JSON array it returns.
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let mut url = self.inner.rest_base.join(table)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("select", "*");
            for (column, filter) in filters {
                query.append_pair(column, filter);
            }
        }

        let response = self
            .inner
            .client
            .get(url)
            .header("apikey", &self.inner.api_key)
            .bearer_auth(&self.inner.api_key)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                table,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!(
                error = %e,
                table,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// All catalog products, newest first.
    ///
    /// Rows that break a catalog invariant are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let rows: Vec<ProductRow> = self
            .select("products", &[("order", "created_at.desc".to_string())])
            .await?;
        let products: Vec<Product> = rows.into_iter().filter_map(ProductRow::into_product).collect();

        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// One product by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Option<Product>, BackendError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let rows: Vec<ProductRow> = self
            .select("products", &[("id", format!("eq.{id}"))])
            .await?;
        let Some(product) = rows.into_iter().find_map(ProductRow::into_product) else {
            return Ok(None);
        };

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(Some(product))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// The order carrying `sku`, if any. Never cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn order_by_sku(&self, sku: &Sku) -> Result<Option<OrderRow>, BackendError> {
        let rows: Vec<OrderRow> = self
            .select(
                "orders",
                &[
                    ("sku", format!("eq.{sku}")),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

/// `{base}/rest/v1/`, keeping any path prefix of the base URL.
fn rest_base(base: &Url) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join("rest/v1/")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_base_without_trailing_slash() {
        let base = Url::parse("https://abc.supabase.co").unwrap();
        assert_eq!(
            rest_base(&base).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/"
        );
    }

    #[test]
    fn test_rest_base_keeps_path_prefix() {
        let base = Url::parse("https://gateway.example.com/backend").unwrap();
        assert_eq!(
            rest_base(&base).unwrap().as_str(),
            "https://gateway.example.com/backend/rest/v1/"
        );
    }

    #[test]
    fn test_table_url_with_filters() {
        let mut url = rest_base(&Url::parse("https://abc.supabase.co/").unwrap())
            .unwrap()
            .join("orders")
            .unwrap();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("sku", "eq.BW001234");
        assert_eq!(
            url.as_str(),
            "https://abc.supabase.co/rest/v1/orders?select=*&sku=eq.BW001234"
        );
    }
}
