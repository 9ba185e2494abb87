//! Hosted backend client for the admin panel.
//!
//! Uses the service-role key, so it can write catalog rows and upload to
//! storage. Identity checks go through the auth endpoint with the caller's
//! own access token.

mod memory;

pub use memory::MemoryBackend;

use std::sync::Arc;

use bw_core::{ProductId, ProductImage, ProfileId};
use reqwest::{RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use url::Url;

use crate::config::BackendConfig;
use crate::middleware::auth::IdentityProvider;
use crate::models::{AuthUser, Profile};
use crate::products::{CatalogWriter, ImageUpload, NewProductRow};

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

    /// Rejected by an in-process backend.
    #[error("{0}")]
    Rejected(String),
}

// =============================================================================
// BackendClient
// =============================================================================

/// Service-role client for the hosted REST, auth and storage APIs.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    base: Url,
    service_key: SecretString,
    image_bucket: String,
}

impl BackendClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot be normalized.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        Ok(Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                base: with_trailing_slash(&config.url)?,
                service_key: config.service_key.clone(),
                image_bucket: config.image_bucket.clone(),
            }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.inner.base.join(path)?)
    }

    /// Attach the service key as both `apikey` and bearer token.
    fn service(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.inner.service_key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }

    /// Send a request and return the response body on success.
    async fn send(&self, request: RequestBuilder, context: &str) -> Result<String, BackendError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
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
                context,
                body = %body.chars().take(500).collect::<String>(),
                "Backend returned non-success status"
            );
            return Err(BackendError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }

    fn parse<T: DeserializeOwned>(body: &str, context: &str) -> Result<T, BackendError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                context,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            BackendError::Parse(e)
        })
    }

    // =========================================================================
    // Identity
    // =========================================================================

    /// The user an access token belongs to, or `None` if the token is not
    /// accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the auth service cannot be reached.
    #[instrument(skip(self, token))]
    pub async fn user_for_token(&self, token: &str) -> Result<Option<AuthUser>, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let request = self
            .inner
            .client
            .get(url)
            .header("apikey", self.inner.service_key.expose_secret())
            .bearer_auth(token);

        match self.send(request, "auth/v1/user").await {
            Ok(body) => Self::parse(&body, "auth/v1/user").map(Some),
            Err(BackendError::Status { status, .. }) if status == 401 || status == 403 => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// The `profiles` row for a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(profile_id = %id))]
    pub async fn profile(&self, id: ProfileId) -> Result<Option<Profile>, BackendError> {
        let mut url = self.endpoint("rest/v1/profiles")?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"))
            .append_pair("limit", "1");

        let request = self
            .service(self.inner.client.get(url))
            .header("Accept", "application/json");
        let body = self.send(request, "profiles").await?;
        let rows: Vec<Profile> = Self::parse(&body, "profiles")?;
        Ok(rows.into_iter().next())
    }

    // =========================================================================
    // Storage
    // =========================================================================

    /// Public URL of an object in the image bucket.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL cannot be built.
    pub fn public_image_url(&self, path: &str) -> Result<String, BackendError> {
        let url = self.endpoint(&format!(
            "storage/v1/object/public/{}/{}",
            self.inner.image_bucket,
            encode_object_path(path)
        ))?;
        Ok(url.to_string())
    }

    async fn insert(&self, table: &str, body: serde_json::Value) -> Result<(), BackendError> {
        let url = self.endpoint(&format!("rest/v1/{table}"))?;
        let request = self
            .service(self.inner.client.post(url))
            .header("Prefer", "return=minimal")
            .json(&body);
        self.send(request, table).await?;
        Ok(())
    }
}

impl CatalogWriter for BackendClient {
    #[instrument(skip(self, row), fields(sku = %row.sku))]
    async fn insert_product(&self, row: &NewProductRow) -> Result<(), BackendError> {
        self.insert("products", serde_json::to_value(row)?).await
    }

    #[instrument(skip(self, image), fields(size = image.bytes.len()))]
    async fn upload_image(&self, path: &str, image: &ImageUpload) -> Result<String, BackendError> {
        let url = self.endpoint(&format!(
            "storage/v1/object/{}/{}",
            self.inner.image_bucket,
            encode_object_path(path)
        ))?;
        let request = self
            .service(self.inner.client.post(url))
            .header("Content-Type", &image.content_type)
            .header("x-upsert", "false")
            .body(image.bytes.clone());
        self.send(request, "storage").await?;
        self.public_image_url(path)
    }

    async fn insert_product_image(&self, image: &ProductImage) -> Result<(), BackendError> {
        self.insert("product_images", serde_json::to_value(image)?)
            .await
    }

    #[instrument(skip(self, urls), fields(product_id = %id, count = urls.len()))]
    async fn set_product_images(&self, id: ProductId, urls: &[String]) -> Result<(), BackendError> {
        let mut url = self.endpoint("rest/v1/products")?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let request = self
            .service(self.inner.client.patch(url))
            .header("Prefer", "return=minimal")
            .json(&json!({ "images": urls }));
        self.send(request, "products").await?;
        Ok(())
    }
}

impl IdentityProvider for BackendClient {
    async fn profile_for_token(&self, token: &str) -> Result<Option<Profile>, BackendError> {
        let Some(user) = self.user_for_token(token).await? else {
            return Ok(None);
        };
        let profile = self.profile(user.id).await?;
        Ok(Some(profile.unwrap_or_else(|| Profile::for_user(user))))
    }
}

/// Percent-encode each segment of a storage object path, keeping the `/`
/// separators.
fn encode_object_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn with_trailing_slash(base: &Url) -> Result<Url, url::ParseError> {
    if base.path().ends_with('/') {
        return Ok(base.clone());
    }
    base.join(&format!("{}/", base.path()))
}

// =============================================================================
// AdminBackend
// =============================================================================

/// The backend the admin app runs against.
#[derive(Clone)]
pub enum AdminBackend {
    Hosted(BackendClient),
    Memory(MemoryBackend),
}

impl CatalogWriter for AdminBackend {
    async fn insert_product(&self, row: &NewProductRow) -> Result<(), BackendError> {
        match self {
            Self::Hosted(client) => client.insert_product(row).await,
            Self::Memory(memory) => memory.insert_product(row).await,
        }
    }

    async fn upload_image(&self, path: &str, image: &ImageUpload) -> Result<String, BackendError> {
        match self {
            Self::Hosted(client) => client.upload_image(path, image).await,
            Self::Memory(memory) => memory.upload_image(path, image).await,
        }
    }

    async fn insert_product_image(&self, image: &ProductImage) -> Result<(), BackendError> {
        match self {
            Self::Hosted(client) => client.insert_product_image(image).await,
            Self::Memory(memory) => memory.insert_product_image(image).await,
        }
    }

    async fn set_product_images(&self, id: ProductId, urls: &[String]) -> Result<(), BackendError> {
        match self {
            Self::Hosted(client) => client.set_product_images(id, urls).await,
            Self::Memory(memory) => memory.set_product_images(id, urls).await,
        }
    }
}

impl IdentityProvider for AdminBackend {
    async fn profile_for_token(&self, token: &str) -> Result<Option<Profile>, BackendError> {
        match self {
            Self::Hosted(client) => client.profile_for_token(token).await,
            Self::Memory(memory) => memory.profile_for_token(token).await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(url: &str) -> BackendClient {
        BackendClient::new(&BackendConfig {
            url: Url::parse(url).unwrap(),
            service_key: SecretString::from("eyJhbGciOiJIUzI1NiJ9.c2VydmljZQ.k3v9"),
            image_bucket: "product-images".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_encode_object_path_keeps_separators() {
        assert_eq!(
            encode_object_path("abc/1700-front view.jpg"),
            "abc/1700-front%20view.jpg"
        );
    }

    #[test]
    fn test_public_image_url() {
        let client = client("https://abc.supabase.co");
        assert_eq!(
            client.public_image_url("p1/1-front.jpg").unwrap(),
            "https://abc.supabase.co/storage/v1/object/public/product-images/p1/1-front.jpg"
        );
    }

    #[test]
    fn test_endpoint_keeps_path_prefix() {
        let client = client("https://gateway.example.com/backend");
        assert_eq!(
            client.endpoint("rest/v1/products").unwrap().as_str(),
            "https://gateway.example.com/backend/rest/v1/products"
        );
    }
}
