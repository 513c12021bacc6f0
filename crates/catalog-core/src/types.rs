//! ============================================================================
//! Core Types for the Catalog Browser
//! ============================================================================
//! Product records as served by the catalog API, listing pages, sparse edit
//! patches, and the error taxonomy shared by the loader and detail views.
//! Field names follow the API's camelCase JSON.
//! ============================================================================

use serde::{Deserialize, Serialize};

/// A product as returned by the catalog API. Never mutated in place;
/// local edits are layered on with [`ProductPatch::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: u64,
    pub title: String,
    pub category: String,
    pub price: f64,
    /// 0.0 - 5.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// 0.0 - 100.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl Product {
    /// Minimal product with only the required fields set
    pub fn new(id: u64, title: impl Into<String>, category: impl Into<String>, price: f64) -> Self {
        Self {
            id,
            title: title.into(),
            category: category.into(),
            price,
            rating: None,
            discount_percentage: None,
            stock: None,
            brand: None,
            description: None,
            thumbnail: None,
            images: None,
            tags: None,
        }
    }

    /// Images to show in the detail gallery. Falls back to the thumbnail
    /// when the product has no image list.
    pub fn gallery(&self) -> Vec<String> {
        match &self.images {
            Some(images) if !images.is_empty() => images.clone(),
            _ => self.thumbnail.iter().cloned().collect(),
        }
    }
}

/// One page of the listing endpoint.
/// `total` is the size of the whole remote collection, not of this page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogPage {
    pub products: Vec<Product>,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl CatalogPage {
    pub fn new(products: Vec<Product>, total: usize) -> Self {
        Self {
            products,
            total,
            skip: None,
            limit: None,
        }
    }
}

/// Sparse override of product fields. `None` means "keep the original".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold a later patch into this one; fields set in `later` win.
    pub fn merge(&mut self, later: ProductPatch) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.title, later.title);
        take(&mut self.category, later.category);
        take(&mut self.price, later.price);
        take(&mut self.rating, later.rating);
        take(&mut self.discount_percentage, later.discount_percentage);
        take(&mut self.stock, later.stock);
        take(&mut self.brand, later.brand);
        take(&mut self.description, later.description);
        take(&mut self.thumbnail, later.thumbnail);
        take(&mut self.images, later.images);
        take(&mut self.tags, later.tags);
    }

    /// Produce `original` with every set field of this patch overriding it.
    pub fn apply(&self, original: &Product) -> Product {
        let mut product = original.clone();
        if let Some(title) = &self.title {
            product.title = title.clone();
        }
        if let Some(category) = &self.category {
            product.category = category.clone();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if self.rating.is_some() {
            product.rating = self.rating;
        }
        if self.discount_percentage.is_some() {
            product.discount_percentage = self.discount_percentage;
        }
        if self.stock.is_some() {
            product.stock = self.stock;
        }
        if self.brand.is_some() {
            product.brand = self.brand.clone();
        }
        if self.description.is_some() {
            product.description = self.description.clone();
        }
        if self.thumbnail.is_some() {
            product.thumbnail = self.thumbnail.clone();
        }
        if self.images.is_some() {
            product.images = self.images.clone();
        }
        if self.tags.is_some() {
            product.tags = self.tags.clone();
        }
        product
    }
}

/// Errors surfaced by catalog fetches. Cloneable so the loader can keep
/// the last one in its snapshot for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to fetch products: {0}")]
    Network(String),

    #[error("Product not found: {0}")]
    NotFound(u64),

    #[error("Invalid catalog response: {0}")]
    InvalidResponse(String),
}
