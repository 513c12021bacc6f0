//! ============================================================================
//! CATALOG-CORE: Product catalog browsing engine
//! ============================================================================
//! This crate handles everything behind the catalog screens:
//! - Incremental page loading from the catalog REST API
//! - Filter predicate + query-string codec kept in sync with the listing
//! - Listing/detail view composition
//! - Local product edits and the authenticated-mode flag
//! ============================================================================

pub mod catalog;
pub mod config;
pub mod edit;
pub mod filter;
pub mod store;
pub mod types;
pub mod view;

// Re-export main types for convenience
pub use catalog::{CatalogLoader, CatalogSnapshot, CatalogSource, HttpCatalogSource, LoadOutcome};
pub use config::CatalogConfig;
pub use edit::{EditForm, EditOverlay};
pub use filter::{FilterState, QueryParams};
pub use store::LocalStore;
pub use types::*;
pub use view::{ListingController, ListingView, ProductDetail};
