//! ============================================================================
//! View Module - Data the presentation layer renders
//! ============================================================================
//! - `listing`: categories, filtered products and counts for the listing
//! - `detail`: one product with local edits and its image gallery
//! ============================================================================

mod detail;
mod listing;

pub use detail::{load_detail, ImageCursor, ProductDetail};
pub use listing::{
    apply_filter_change, categories, compose, compose_edited, DisplayCount, ListingController,
    ListingState, ListingView, MemoryLocation, QueryLocation,
};
