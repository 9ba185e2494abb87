//! Product editor route handlers.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartError},
    http::StatusCode,
};
use chrono::Utc;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::products::{CreatedProduct, ImageUpload, ProductForm, create_product};
use crate::state::AppState;

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.body_text())
    }
}

/// Create a product from the editor form.
///
/// Text parts fill the form; `sizes` and `tags` may repeat. Every `images`
/// part carrying a file is uploaded after the product row is written.
#[instrument(skip(state, admin, multipart), fields(admin = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedProduct>)> {
    let (form, images) = read_form(multipart).await?;
    let draft = form.validate()?;

    let created = create_product(state.backend(), draft, images, Utc::now()).await?;
    if !created.failed_uploads.is_empty() {
        tracing::warn!(
            product_id = %created.product_id,
            failed = created.failed_uploads.len(),
            "Product created with missing images"
        );
    }

    Ok((StatusCode::CREATED, Json(created)))
}

async fn read_form(mut multipart: Multipart) -> Result<(ProductForm, Vec<ImageUpload>)> {
    let mut form = ProductForm::default();
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        if name == "images" {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_owned();
            let bytes = field.bytes().await?;
            // Browsers send an empty part for an untouched file input.
            if file_name.is_empty() && bytes.is_empty() {
                continue;
            }
            if !content_type.starts_with("image/") {
                return Err(AppError::BadRequest(format!(
                    "{file_name} is not an image ({content_type})"
                )));
            }
            images.push(ImageUpload {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field.text().await?;
        match name.as_str() {
            "name" => form.name = value,
            "description" => form.description = value,
            "price" => form.price = value,
            "category" => form.category = value,
            "sku" => form.sku = value,
            "color" => form.color = value,
            "sizes" => form.sizes.push(value),
            "tags" => form.tags.push(value),
            "stock_quantity" => form.stock_quantity = value,
            other => tracing::debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok((form, images))
}
