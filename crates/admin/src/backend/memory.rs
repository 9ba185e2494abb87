//! In-process backend for local runs and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use bw_core::{ProductId, ProductImage};

use super::BackendError;
use crate::middleware::auth::IdentityProvider;
use crate::models::Profile;
use crate::products::{CatalogWriter, ImageUpload, NewProductRow};

/// Keeps products, images and sessions in memory.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    public_base: String,
    sessions: HashMap<String, Profile>,
    products: HashMap<ProductId, NewProductRow>,
    objects: HashMap<String, usize>,
    images: Vec<ProductImage>,
    failing_uploads: HashSet<String>,
}

impl MemoryBackend {
    /// Create an empty backend whose public image URLs start with `public_base`.
    #[must_use]
    pub fn new(public_base: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryState {
                public_base: public_base.trim_end_matches('/').to_string(),
                ..MemoryState::default()
            })),
        }
    }

    /// Accept `token` as belonging to `profile`.
    pub fn add_session(&self, token: &str, profile: Profile) {
        if let Ok(mut state) = self.inner.write() {
            state.sessions.insert(token.to_string(), profile);
        }
    }

    /// Make uploads of files named `file_name` fail.
    pub fn fail_uploads_named(&self, file_name: &str) {
        if let Ok(mut state) = self.inner.write() {
            state.failing_uploads.insert(file_name.to_string());
        }
    }

    #[must_use]
    pub fn product(&self, id: ProductId) -> Option<NewProductRow> {
        self.inner
            .read()
            .ok()
            .and_then(|state| state.products.get(&id).cloned())
    }

    #[must_use]
    pub fn products(&self) -> Vec<NewProductRow> {
        self.inner
            .read()
            .map(|state| state.products.values().cloned().collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn product_images(&self) -> Vec<ProductImage> {
        self.inner
            .read()
            .map(|state| state.images.clone())
            .unwrap_or_default()
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, MemoryState>, BackendError> {
        self.inner
            .write()
            .map_err(|_| BackendError::Rejected("memory backend poisoned".to_string()))
    }
}

impl CatalogWriter for MemoryBackend {
    async fn insert_product(&self, row: &NewProductRow) -> Result<(), BackendError> {
        let mut state = self.write()?;
        if state.products.values().any(|p| p.sku == row.sku) {
            return Err(BackendError::Rejected(format!(
                "duplicate key value violates unique constraint on sku {}",
                row.sku
            )));
        }
        state.products.insert(row.id, row.clone());
        Ok(())
    }

    async fn upload_image(&self, path: &str, image: &ImageUpload) -> Result<String, BackendError> {
        let mut state = self.write()?;
        if state.failing_uploads.contains(&image.file_name) {
            return Err(BackendError::Rejected(format!(
                "upload of {} refused",
                image.file_name
            )));
        }
        if state.objects.contains_key(path) {
            return Err(BackendError::Rejected(format!("object {path} already exists")));
        }
        state.objects.insert(path.to_string(), image.bytes.len());
        Ok(format!("{}/{path}", state.public_base))
    }

    async fn insert_product_image(&self, image: &ProductImage) -> Result<(), BackendError> {
        self.write()?.images.push(image.clone());
        Ok(())
    }

    async fn set_product_images(&self, id: ProductId, urls: &[String]) -> Result<(), BackendError> {
        let mut state = self.write()?;
        let product = state
            .products
            .get_mut(&id)
            .ok_or_else(|| BackendError::Rejected(format!("no product {id}")))?;
        product.images = urls.to_vec();
        Ok(())
    }
}

impl IdentityProvider for MemoryBackend {
    async fn profile_for_token(&self, token: &str) -> Result<Option<Profile>, BackendError> {
        Ok(self
            .inner
            .read()
            .ok()
            .and_then(|state| state.sessions.get(token).cloned()))
    }
}
