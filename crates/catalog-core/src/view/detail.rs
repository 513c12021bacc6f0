//! ============================================================================
//! Product Detail - Single product with local edits and image gallery
//! ============================================================================

use serde::Serialize;
use tracing::debug;

use crate::catalog::CatalogSource;
use crate::edit::EditOverlay;
use crate::types::{CatalogError, Product};

/// A product as the detail screen shows it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    pub product: Product,
    /// True when a local edit was applied
    pub edited: bool,
    pub gallery: Vec<String>,
}

impl ProductDetail {
    pub fn new(original: &Product, overlay: &EditOverlay) -> Self {
        let product = overlay.get_edited_product(original);
        Self {
            gallery: product.gallery(),
            edited: overlay.has_edits(original.id),
            product,
        }
    }

    pub fn images(&self) -> ImageCursor {
        ImageCursor::new(self.gallery.len())
    }
}

/// Fetch a product by id and apply any local edit
pub async fn load_detail(
    source: &dyn CatalogSource,
    overlay: &EditOverlay,
    id: u64,
) -> Result<ProductDetail, CatalogError> {
    let original = source.get_product(id).await?;
    debug!("Loaded product {} ({})", id, original.title);
    Ok(ProductDetail::new(&original, overlay))
}

/// Position in a gallery; `next` and `prev` wrap around
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCursor {
    len: usize,
    index: usize,
}

impl ImageCursor {
    pub fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Previous/next controls are only shown for more than one image
    pub fn can_navigate(&self) -> bool {
        self.len > 1
    }

    pub fn next(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + 1) % self.len;
        }
        self.index
    }

    pub fn prev(&mut self) -> usize {
        if self.len > 0 {
            self.index = (self.index + self.len - 1) % self.len;
        }
        self.index
    }

    /// Jump to a thumbnail; out-of-range indices are ignored
    pub fn select(&mut self, index: usize) -> usize {
        if index < self.len {
            self.index = index;
        }
        self.index
    }
}
