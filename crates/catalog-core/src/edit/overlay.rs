//! ============================================================================
//! Edit Overlay - Session-local product edits
//! ============================================================================
//! Edits are sparse `ProductPatch`es keyed by product id, merged onto the
//! server record whenever the product is displayed. Nothing here is sent to
//! the catalog API. The store is injected so tests and sessions stay isolated.
//! ============================================================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::types::{Product, ProductPatch};

/// Key-value storage for pending edits.
/// `merge` must be atomic per id: concurrent merges for one product may not
/// lose fields.
pub trait EditStore: Send + Sync {
    fn get(&self, id: u64) -> Option<ProductPatch>;

    /// Fold `patch` into the stored edit for `id`, creating it if absent.
    /// Returns the stored edit after the merge.
    fn merge(&self, id: u64, patch: ProductPatch) -> ProductPatch;

    /// Drop the stored edit for `id`; returns whether one existed
    fn clear(&self, id: u64) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local edit store. Lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryEditStore {
    edits: Mutex<HashMap<u64, ProductPatch>>,
}

impl InMemoryEditStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn edits(&self) -> MutexGuard<'_, HashMap<u64, ProductPatch>> {
        // A panic mid-merge leaves at worst a partially merged patch
        self.edits.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EditStore for InMemoryEditStore {
    fn get(&self, id: u64) -> Option<ProductPatch> {
        self.edits().get(&id).cloned()
    }

    fn merge(&self, id: u64, patch: ProductPatch) -> ProductPatch {
        let mut edits = self.edits();
        let stored = edits.entry(id).or_default();
        stored.merge(patch);
        stored.clone()
    }

    fn clear(&self, id: u64) -> bool {
        self.edits().remove(&id).is_some()
    }

    fn len(&self) -> usize {
        self.edits().len()
    }
}

/// Reads and writes product edits through an `EditStore`
#[derive(Clone)]
pub struct EditOverlay {
    store: Arc<dyn EditStore>,
}

impl EditOverlay {
    pub fn new(store: Arc<dyn EditStore>) -> Self {
        Self { store }
    }

    /// Overlay backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryEditStore::new()))
    }

    /// `original` with any stored edit applied on top
    pub fn get_edited_product(&self, original: &Product) -> Product {
        match self.store.get(original.id) {
            Some(patch) => patch.apply(original),
            None => original.clone(),
        }
    }

    /// Merge `patch` into the stored edit for `id`. No validation happens
    /// here; see `EditForm` for the form rules.
    pub fn save_edit(&self, id: u64, patch: ProductPatch) -> ProductPatch {
        let stored = self.store.merge(id, patch);
        debug!("Saved edit for product {}", id);
        stored
    }

    pub fn has_edits(&self, id: u64) -> bool {
        self.store.get(id).is_some()
    }

    pub fn discard(&self, id: u64) -> bool {
        self.store.clear(id)
    }

    /// Accessor pair bound to one product id
    pub fn for_product(&self, id: u64) -> ProductEdits {
        ProductEdits {
            id,
            overlay: self.clone(),
        }
    }
}

/// `get_edited_product` / `save_edit` for a single product
#[derive(Clone)]
pub struct ProductEdits {
    id: u64,
    overlay: EditOverlay,
}

impl ProductEdits {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn get_edited_product(&self, original: &Product) -> Product {
        self.overlay.get_edited_product(original)
    }

    pub fn save_edit(&self, patch: ProductPatch) -> ProductPatch {
        self.overlay.save_edit(self.id, patch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn original() -> Product {
        Product {
            rating: Some(4.5),
            description: Some("Leather".to_string()),
            ..Product::new(1, "Red Shoe", "Shoes", 50.0)
        }
    }

    #[test]
    fn test_unedited_product_is_returned_as_is() {
        let overlay = EditOverlay::in_memory();
        assert_eq!(overlay.get_edited_product(&original()), original());
        assert!(!overlay.has_edits(1));
    }

    #[test]
    fn test_successive_edits_merge() {
        let overlay = EditOverlay::in_memory();
        overlay.save_edit(
            1,
            ProductPatch {
                price: Some(10.0),
                ..Default::default()
            },
        );
        overlay.save_edit(
            1,
            ProductPatch {
                title: Some("X".to_string()),
                ..Default::default()
            },
        );

        let edited = overlay.get_edited_product(&original());
        assert_eq!(edited.price, 10.0);
        assert_eq!(edited.title, "X");
        assert_eq!(edited.category, "Shoes");
        assert_eq!(edited.rating, Some(4.5));
        assert_eq!(edited.description.as_deref(), Some("Leather"));
    }

    #[test]
    fn test_later_edit_wins_on_conflict() {
        let edits = EditOverlay::in_memory().for_product(1);
        edits.save_edit(ProductPatch {
            price: Some(10.0),
            ..Default::default()
        });
        let stored = edits.save_edit(ProductPatch {
            price: Some(12.0),
            ..Default::default()
        });
        assert_eq!(stored.price, Some(12.0));
        assert_eq!(edits.get_edited_product(&original()).price, 12.0);
    }

    #[test]
    fn test_edits_are_per_product() {
        let overlay = EditOverlay::in_memory();
        overlay.save_edit(
            2,
            ProductPatch {
                title: Some("Other".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(overlay.get_edited_product(&original()).title, "Red Shoe");
    }

    #[test]
    fn test_overlays_with_separate_stores_are_isolated() {
        let a = EditOverlay::in_memory();
        let b = EditOverlay::in_memory();
        a.save_edit(
            1,
            ProductPatch {
                price: Some(1.0),
                ..Default::default()
            },
        );
        assert!(a.has_edits(1));
        assert!(!b.has_edits(1));
    }

    #[test]
    fn test_shared_store_is_seen_by_every_overlay() {
        let store: Arc<dyn EditStore> = Arc::new(InMemoryEditStore::new());
        let writer = EditOverlay::new(store.clone());
        let reader = EditOverlay::new(store.clone());
        writer.save_edit(
            1,
            ProductPatch {
                stock: Some(3),
                ..Default::default()
            },
        );
        assert_eq!(reader.get_edited_product(&original()).stock, Some(3));
        assert_eq!(store.len(), 1);

        assert!(reader.discard(1));
        assert!(store.is_empty());
    }

    #[test]
    fn test_empty_edit_leaves_product_unchanged() {
        let overlay = EditOverlay::in_memory();
        overlay.save_edit(1, ProductPatch::default());
        assert!(overlay.has_edits(1));
        assert_eq!(overlay.get_edited_product(&original()), original());
    }

    #[test]
    fn test_concurrent_merges_keep_every_field() {
        let store = Arc::new(InMemoryEditStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                std::thread::spawn(move || {
                    let patch = if i % 2 == 0 {
                        ProductPatch {
                            price: Some(i as f64),
                            ..Default::default()
                        }
                    } else {
                        ProductPatch {
                            stock: Some(i),
                            ..Default::default()
                        }
                    };
                    store.merge(1, patch);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let stored = store.get(1).unwrap();
        assert!(stored.price.is_some());
        assert!(stored.stock.is_some());
    }
}
