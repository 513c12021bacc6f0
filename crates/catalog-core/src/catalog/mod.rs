//! ============================================================================
//! Catalog Module - Remote product listing and incremental loading
//! ============================================================================
//! - `CatalogSource`: paginated listing + get-by-id (HTTP implementation)
//! - `CatalogLoader`: accumulates pages with a single-flight "load more" guard
//!
//! ## Usage
//! ```rust,ignore
//! use catalog_core::catalog::{CatalogLoader, HttpCatalogSource};
//!
//! let loader = CatalogLoader::new(Arc::new(HttpCatalogSource::default()));
//! loader.load_initial().await;
//! // sentinel scrolled into view
//! loader.load_more().await;
//! let snapshot = loader.snapshot().await;
//! ```
//! ============================================================================

mod loader;
mod source;

pub use loader::{CatalogLoader, CatalogSnapshot, LoadOutcome, PAGE_SIZE};
pub use source::{CatalogSource, HttpCatalogSource, DEFAULT_API_BASE};
