//! Catalog administration commands.
//!
//! # Environment Variables
//!
//! - `BACKEND_URL` - Hosted backend base URL
//! - `BACKEND_SERVICE_KEY` - Service-role API key
//! - `ADMIN_IMAGE_BUCKET` - Storage bucket for product images (default: product-images)

use std::path::{Path, PathBuf};

use bw_admin::backend::BackendClient;
use bw_admin::config::BackendConfig;
use bw_admin::products::{ImageUpload, ProductForm, create_product as create};
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur while reading product images.
#[derive(Debug, Error)]
pub enum ImageError {
    /// File could not be read.
    #[error("Cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    /// File extension is not a known image type.
    #[error("{0} is not a supported image (jpg, jpeg, png, webp, gif, avif)")]
    Unsupported(String),
}

/// Create a product through the hosted backend and upload its images.
///
/// # Errors
///
/// Returns an error if the form does not validate, an image cannot be read,
/// the backend is not configured, or the product row cannot be written.
/// Individual image upload failures are logged, not returned.
pub async fn create_product(
    form: &ProductForm,
    images: &[PathBuf],
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate and read everything before touching the backend
    let draft = form.validate()?;
    let mut uploads = Vec::with_capacity(images.len());
    for path in images {
        uploads.push(read_image(path).await?);
    }

    let config = BackendConfig::from_env()?;
    let client = BackendClient::new(&config)?;

    info!(sku = %draft.sku, images = uploads.len(), "Creating product");
    let created = create(&client, draft, uploads, Utc::now()).await?;

    info!(product_id = %created.product_id, "Product created");
    for image in &created.images {
        info!(url = %image.image_url, primary = image.is_primary, "Image stored");
    }
    for failed in &created.failed_uploads {
        warn!(file = %failed.file_name, error = %failed.error, "Image not stored");
    }

    Ok(())
}

async fn read_image(path: &Path) -> Result<ImageUpload, ImageError> {
    let display = path.display().to_string();
    let content_type =
        content_type_for(path).ok_or_else(|| ImageError::Unsupported(display.clone()))?;
    let bytes = tokio::fs::read(path).await.map_err(|source| ImageError::Read {
        path: display.clone(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map_or(display, |name| name.to_string_lossy().into_owned());

    Ok(ImageUpload {
        file_name,
        content_type: content_type.to_string(),
        bytes,
    })
}

/// MIME type for an image path, by extension.
fn content_type_for(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}
