//! Favorites set.
//!
//! Product IDs the shopper has hearted, persisted under
//! [`FAVORITES_STORAGE_KEY`] independently of the cart.

use std::sync::Arc;

use bw_core::ProductId;
use tracing::instrument;

use crate::storage::{ClientStorage, StorageError, load_json, save_json};

/// Storage key holding the favorites array.
pub const FAVORITES_STORAGE_KEY: &str = "favorites";

/// Membership set of favorite products, in the order they were added.
pub struct FavoritesEngine {
    ids: Vec<ProductId>,
    storage: Arc<dyn ClientStorage>,
}

impl std::fmt::Debug for FavoritesEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesEngine")
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl FavoritesEngine {
    /// Restore favorites from storage, or start empty.
    #[must_use]
    pub fn restore(storage: Arc<dyn ClientStorage>) -> Self {
        let mut ids: Vec<ProductId> =
            load_json(storage.as_ref(), FAVORITES_STORAGE_KEY).unwrap_or_default();
        // Older snapshots may carry duplicates; keep first occurrence.
        let mut seen = std::collections::HashSet::new();
        ids.retain(|id| seen.insert(*id));
        Self { ids, storage }
    }

    /// Flip membership of `product_id` and return whether it is now a favorite.
    ///
    /// # Errors
    ///
    /// Returns an error if the set cannot be persisted.
    #[instrument(skip(self))]
    pub fn toggle(&mut self, product_id: ProductId) -> Result<bool, StorageError> {
        let now_favorite = if let Some(pos) = self.ids.iter().position(|id| *id == product_id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(product_id);
            true
        };
        save_json(self.storage.as_ref(), FAVORITES_STORAGE_KEY, &self.ids)?;
        Ok(now_favorite)
    }

    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.ids.contains(&product_id)
    }

    #[must_use]
    pub fn ids(&self) -> &[ProductId] {
        &self.ids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut favorites = FavoritesEngine::restore(Arc::new(MemoryStorage::new()));
        let kept = ProductId::new();
        let flipped = ProductId::new();
        favorites.toggle(kept).unwrap();

        for _ in 0..3 {
            let before = favorites.ids().to_vec();
            assert!(favorites.toggle(flipped).unwrap());
            assert!(!favorites.toggle(flipped).unwrap());
            assert_eq!(favorites.ids(), before.as_slice());
        }
        assert!(favorites.contains(kept));
        assert!(!favorites.contains(flipped));
    }

    #[test]
    fn test_toggle_off_an_existing_favorite() {
        let mut favorites = FavoritesEngine::restore(Arc::new(MemoryStorage::new()));
        let id = ProductId::new();
        favorites.toggle(id).unwrap();
        favorites.toggle(id).unwrap();
        favorites.toggle(id).unwrap();
        assert!(favorites.contains(id));
        assert_eq!(favorites.len(), 1);
    }

    #[test]
    fn test_persists_across_restart() {
        let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
        let a = ProductId::new();
        let b = ProductId::new();

        let mut favorites = FavoritesEngine::restore(Arc::clone(&storage));
        favorites.toggle(a).unwrap();
        favorites.toggle(b).unwrap();

        let restarted = FavoritesEngine::restore(storage);
        assert_eq!(restarted.ids(), &[a, b]);
    }

    #[test]
    fn test_restore_drops_duplicates() {
        let storage: Arc<dyn ClientStorage> = Arc::new(MemoryStorage::new());
        let id = ProductId::new();
        save_json(storage.as_ref(), FAVORITES_STORAGE_KEY, &[id, id]).unwrap();

        let favorites = FavoritesEngine::restore(storage);
        assert_eq!(favorites.len(), 1);
    }
}
