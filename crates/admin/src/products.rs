//! Admin product editor.
//!
//! Turns the raw "new product" form into a validated [`ProductDraft`], writes
//! it to the catalog and uploads its images.
//!
//! Image handling is best effort: the product row is written first, then each
//! image is uploaded and linked on its own. A failed image is logged and
//! reported back in [`CreatedProduct::failed_uploads`]; it is not retried and
//! the product is not rolled back.

use std::future::Future;

use bw_core::{
    Color, ColorError, Price, PriceError, ProductId, ProductImage, Sku, SkuError, slugify,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::backend::BackendError;

/// Raw form input, every field as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub sizes: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub stock_quantity: String,
}

/// Why a [`ProductForm`] was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProductFormError {
    #[error("Please fill in all required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("invalid price: {0}")]
    InvalidPrice(#[source] PriceError),

    #[error(transparent)]
    InvalidColor(#[from] ColorError),

    #[error("invalid SKU: {0}")]
    InvalidSku(#[source] SkuError),

    #[error("invalid stock quantity '{0}'")]
    InvalidStock(String),
}

/// A product ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub sku: Sku,
    pub color: Color,
    pub sizes: Vec<String>,
    pub tags: Vec<String>,
    pub stock: u32,
}

impl ProductForm {
    /// Validate the form.
    ///
    /// Name, price, category, SKU and color are required. A stock value that
    /// is blank or not a number counts as zero; a negative one is rejected.
    ///
    /// # Errors
    ///
    /// Returns every missing required field at once, or the first field that
    /// does not parse.
    pub fn validate(&self) -> Result<ProductDraft, ProductFormError> {
        let required = [
            ("name", &self.name),
            ("price", &self.price),
            ("category", &self.category),
            ("sku", &self.sku),
            ("color", &self.color),
        ];
        let missing: Vec<&'static str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| *field)
            .collect();
        if !missing.is_empty() {
            return Err(ProductFormError::MissingFields(missing));
        }

        let price = Price::parse(&self.price).map_err(ProductFormError::InvalidPrice)?;
        let color = self.color.parse::<Color>()?;
        let sku = Sku::parse(&self.sku).map_err(ProductFormError::InvalidSku)?;
        let stock = parse_stock(&self.stock_quantity)?;

        Ok(ProductDraft {
            name: self.name.trim().to_owned(),
            description: self.description.trim().to_owned(),
            price,
            category: self.category.trim().to_owned(),
            sku,
            color,
            sizes: normalize_list(&self.sizes, str::to_ascii_uppercase),
            tags: normalize_list(&self.tags, str::to_lowercase),
            stock,
        })
    }
}

/// Leading integer of `raw`, the way a browser's `parseInt` reads it.
/// No digits at all counts as zero.
fn parse_stock(raw: &str) -> Result<u32, ProductFormError> {
    let trimmed = raw.trim();
    let (negative, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return Ok(0);
    }
    if negative && digits.chars().any(|c| c != '0') {
        return Err(ProductFormError::InvalidStock(raw.to_owned()));
    }
    digits
        .parse::<u32>()
        .map_err(|_| ProductFormError::InvalidStock(raw.to_owned()))
}

/// Trim, drop blanks, split comma lists and de-duplicate, keeping order.
fn normalize_list(values: &[String], case: fn(&str) -> String) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in values.iter().flat_map(|v| v.split(',')) {
        let value = case(value.trim());
        if !value.is_empty() && !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

// =============================================================================
// Writing
// =============================================================================

/// Product row as inserted into the `products` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProductRow {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub price: Price,
    pub category: String,
    pub sku: Sku,
    pub color: Color,
    pub sizes: Vec<String>,
    pub tags: Vec<String>,
    pub stock_quantity: u32,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl ProductDraft {
    #[must_use]
    pub fn into_row(self, id: ProductId, created_at: DateTime<Utc>) -> NewProductRow {
        NewProductRow {
            id,
            slug: slugify(&self.name),
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            sku: self.sku,
            color: self.color,
            sizes: self.sizes,
            tags: self.tags,
            stock_quantity: self.stock,
            images: Vec::new(),
            created_at,
        }
    }
}

/// An image file submitted with the form.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Write access to the catalog and its image storage.
pub trait CatalogWriter: Send + Sync {
    /// Insert a product row.
    fn insert_product(
        &self,
        row: &NewProductRow,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Store an image at `path` in the image bucket and return its public URL.
    fn upload_image(
        &self,
        path: &str,
        image: &ImageUpload,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Insert a `product_images` row.
    fn insert_product_image(
        &self,
        image: &ProductImage,
    ) -> impl Future<Output = Result<(), BackendError>> + Send;

    /// Replace the product's image URL list.
    fn set_product_images(
        &self,
        id: ProductId,
        urls: &[String],
    ) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// An image that did not make it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedUpload {
    pub file_name: String,
    pub error: String,
}

/// Result of [`create_product`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedProduct {
    pub product_id: ProductId,
    pub images: Vec<ProductImage>,
    pub failed_uploads: Vec<FailedUpload>,
}

/// Storage path for an uploaded image: `<product_id>/<millis>-<index>-<file name>`.
///
/// `index` is the image's position in the upload, so repeated or blank file
/// names within one product never collide.
#[must_use]
pub fn image_path(product_id: ProductId, millis: i64, index: usize, file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("image");
    format!("{product_id}/{millis}-{index}-{base}")
}

/// Create a product and upload its images.
///
/// The first image stored successfully becomes the primary image.
///
/// # Errors
///
/// Returns an error only if the product row itself cannot be written.
/// Image failures are reported in [`CreatedProduct::failed_uploads`].
#[instrument(skip(writer, draft, images), fields(sku = %draft.sku, images = images.len()))]
pub async fn create_product<W: CatalogWriter>(
    writer: &W,
    draft: ProductDraft,
    images: Vec<ImageUpload>,
    now: DateTime<Utc>,
) -> Result<CreatedProduct, BackendError> {
    let product_id = ProductId::new();
    writer.insert_product(&draft.into_row(product_id, now)).await?;
    tracing::info!(%product_id, "Product created");

    let millis = now.timestamp_millis();
    let mut stored: Vec<ProductImage> = Vec::new();
    let mut failed_uploads = Vec::new();

    for (index, image) in images.iter().enumerate() {
        let path = image_path(product_id, millis, index, &image.file_name);

        let url = match writer.upload_image(&path, image).await {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(file = %image.file_name, error = %e, "Image upload failed");
                failed_uploads.push(FailedUpload {
                    file_name: image.file_name.clone(),
                    error: e.to_string(),
                });
                continue;
            }
        };

        let record = ProductImage {
            product_id,
            image_url: url,
            is_primary: stored.is_empty(),
        };
        if let Err(e) = writer.insert_product_image(&record).await {
            tracing::warn!(file = %image.file_name, error = %e, "Failed to link uploaded image");
            failed_uploads.push(FailedUpload {
                file_name: image.file_name.clone(),
                error: e.to_string(),
            });
            continue;
        }
        stored.push(record);
    }

    if !stored.is_empty() {
        let urls: Vec<String> = stored.iter().map(|i| i.image_url.clone()).collect();
        if let Err(e) = writer.set_product_images(product_id, &urls).await {
            tracing::warn!(%product_id, error = %e, "Failed to update product image list");
        }
    }

    Ok(CreatedProduct {
        product_id,
        images: stored,
        failed_uploads,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn form() -> ProductForm {
        ProductForm {
            name: " Essential Black Tee ".to_string(),
            description: "Heavyweight cotton".to_string(),
            price: "85.00".to_string(),
            category: "tee".to_string(),
            sku: "bwb001".to_string(),
            color: "Black".to_string(),
            sizes: vec!["m, l".to_string(), "XL".to_string(), "M".to_string()],
            tags: vec!["Essential".to_string()],
            stock_quantity: "12".to_string(),
        }
    }

    fn image(name: &str) -> ImageUpload {
        ImageUpload {
            file_name: name.to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![0xFF, 0xD8, 0xFF],
        }
    }

    #[test]
    fn test_valid_form() {
        let draft = form().validate().unwrap();
        assert_eq!(draft.name, "Essential Black Tee");
        assert_eq!(draft.sku.as_str(), "BWB001");
        assert_eq!(draft.color, Color::Black);
        assert_eq!(draft.sizes, ["M", "L", "XL"]);
        assert_eq!(draft.tags, ["essential"]);
        assert_eq!(draft.stock, 12);
    }

    #[test]
    fn test_missing_required_fields_listed_together() {
        let form = ProductForm {
            description: "only a description".to_string(),
            ..ProductForm::default()
        };
        assert_eq!(
            form.validate().unwrap_err(),
            ProductFormError::MissingFields(vec!["name", "price", "category", "sku", "color"])
        );
    }

    #[test]
    fn test_invalid_price_and_color() {
        let zero = ProductForm {
            price: "0".to_string(),
            ..form()
        };
        assert!(matches!(
            zero.validate(),
            Err(ProductFormError::InvalidPrice(_))
        ));

        let grey = ProductForm {
            color: "grey".to_string(),
            ..form()
        };
        assert!(matches!(
            grey.validate(),
            Err(ProductFormError::InvalidColor(_))
        ));
    }

    #[test]
    fn test_stock_parsing() {
        assert_eq!(parse_stock("").unwrap(), 0);
        assert_eq!(parse_stock("lots").unwrap(), 0);
        assert_eq!(parse_stock(" 7 ").unwrap(), 7);
        assert_eq!(parse_stock("12 units").unwrap(), 12);
        assert_eq!(parse_stock("-0").unwrap(), 0);
        assert!(matches!(
            parse_stock("-3"),
            Err(ProductFormError::InvalidStock(_))
        ));
        assert!(parse_stock("99999999999").is_err());
    }

    #[test]
    fn test_image_path() {
        let id = ProductId::new();
        assert_eq!(
            image_path(id, 1_734_000_000_000, 0, "front.jpg"),
            format!("{id}/1734000000000-0-front.jpg")
        );
        assert_eq!(
            image_path(id, 1, 2, "C:\\Users\\me\\back.png"),
            format!("{id}/1-2-back.png")
        );
        assert_eq!(image_path(id, 1, 3, "  "), format!("{id}/1-3-image"));
    }

    #[tokio::test]
    async fn test_create_product_uploads_and_links_images() {
        let backend = MemoryBackend::new("https://cdn.test/product-images");
        let draft = form().validate().unwrap();
        let now = Utc::now();

        let created = create_product(
            &backend,
            draft,
            vec![image("front.jpg"), image("back.jpg")],
            now,
        )
        .await
        .unwrap();

        assert!(created.failed_uploads.is_empty());
        assert_eq!(created.images.len(), 2);
        assert!(created.images[0].is_primary);
        assert!(!created.images[1].is_primary);

        let row = backend.product(created.product_id).unwrap();
        assert_eq!(row.stock_quantity, 12);
        assert_eq!(row.images.len(), 2);
        assert!(row.images[0].ends_with("-front.jpg"));
        assert_eq!(backend.product_images().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_upload_is_reported_not_fatal() {
        let backend = MemoryBackend::new("https://cdn.test/product-images");
        backend.fail_uploads_named("front.jpg");
        let draft = form().validate().unwrap();

        let created = create_product(
            &backend,
            draft,
            vec![image("front.jpg"), image("back.jpg")],
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(created.failed_uploads.len(), 1);
        assert_eq!(created.failed_uploads[0].file_name, "front.jpg");
        assert_eq!(created.images.len(), 1);
        // The first image that made it is primary.
        assert!(created.images[0].is_primary);
        assert!(backend.product(created.product_id).is_some());
    }

    #[tokio::test]
    async fn test_product_without_images() {
        let backend = MemoryBackend::new("https://cdn.test/product-images");
        let created = create_product(&backend, form().validate().unwrap(), vec![], Utc::now())
            .await
            .unwrap();
        assert!(created.images.is_empty());
        assert!(backend.product(created.product_id).unwrap().images.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_file_names_are_all_stored() {
        let backend = MemoryBackend::new("https://cdn.test/product-images");
        let mut blank = image("photo.jpg");
        blank.file_name = String::new();

        let created = create_product(
            &backend,
            form().validate().unwrap(),
            vec![image("photo.jpg"), image("photo.jpg"), blank.clone(), blank],
            Utc::now(),
        )
        .await
        .unwrap();

        assert!(created.failed_uploads.is_empty());
        assert_eq!(created.images.len(), 4);
        let row = backend.product(created.product_id).unwrap();
        let mut urls = row.images.clone();
        urls.sort();
        urls.dedup();
        assert_eq!(urls.len(), 4);
    }
}
