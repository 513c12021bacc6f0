//! ============================================================================
//! Filter Module - Client-side narrowing of the loaded catalog
//! ============================================================================
//! - `FilterState`: the structured filter, validated on form submission
//! - `ProductFilter`: conjunctive predicate compiled from a `FilterState`
//! - `query`: codec between `FilterState` and URL query parameters
//!
//! ## Usage
//! ```rust,ignore
//! use catalog_core::filter::{FilterState, QueryParams};
//!
//! let filter = FilterState::from_query(&QueryParams::parse("categories=Shoes,Hats"));
//! let predicate = filter.predicate();
//! let visible: Vec<_> = products.iter().filter(|p| predicate.matches(p)).collect();
//! ```
//! ============================================================================

mod predicate;
pub mod query;
mod state;

pub use predicate::ProductFilter;
pub use query::{decode, encode, QueryParams};
pub use state::{
    CategorySet, FilterError, FilterField, FilterState, MinRating, MAX_DISCOUNT_PERCENT,
    RATING_CHOICES,
};
