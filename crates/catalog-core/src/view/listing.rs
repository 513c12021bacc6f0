//! ============================================================================
//! Listing View - Loaded catalog + active filter -> what gets rendered
//! ============================================================================
//! Filter changes are explicit state transitions: `apply_filter_change`
//! swaps the filter wholesale and re-encodes the query string. The
//! `ListingController` then persists that query to its `QueryLocation` and
//! reads it back, so the URL stays the source of truth.
//! ============================================================================

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::CatalogSnapshot;
use crate::edit::EditOverlay;
use crate::filter::{decode, encode, FilterState, QueryParams};
use crate::types::{CatalogError, Product};

/// Filtered count against the server total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayCount {
    pub shown: usize,
    pub loaded: usize,
    pub total: usize,
}

impl fmt::Display for DisplayCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Showing {} of {} products", self.shown, self.total)
    }
}

/// Everything the listing screen renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingView {
    /// Distinct categories of the loaded products, sorted
    pub categories: Vec<String>,
    /// Loaded products passing the filter, in server order
    pub products: Vec<Product>,
    pub count: DisplayCount,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<CatalogError>,
}

/// Sorted, deduplicated categories (case-sensitive)
pub fn categories(products: &[Product]) -> Vec<String> {
    products
        .iter()
        .map(|p| p.category.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Derive the listing from a loader snapshot and a filter
pub fn compose(snapshot: &CatalogSnapshot, filter: &FilterState) -> ListingView {
    compose_with(snapshot, filter, |p| p.clone())
}

/// Like `compose`, but products are shown (and filtered) with local edits applied
pub fn compose_edited(
    snapshot: &CatalogSnapshot,
    filter: &FilterState,
    overlay: &EditOverlay,
) -> ListingView {
    compose_with(snapshot, filter, |p| overlay.get_edited_product(p))
}

fn compose_with(
    snapshot: &CatalogSnapshot,
    filter: &FilterState,
    display: impl Fn(&Product) -> Product,
) -> ListingView {
    let predicate = filter.predicate();
    let products: Vec<Product> = snapshot
        .products
        .iter()
        .map(display)
        .filter(|p| predicate.matches(p))
        .collect();

    ListingView {
        categories: categories(&snapshot.products),
        count: DisplayCount {
            shown: products.len(),
            loaded: snapshot.products.len(),
            total: snapshot.total,
        },
        products,
        has_more: snapshot.has_more,
        loading: snapshot.loading,
        error: snapshot.error.clone(),
    }
}

/// Filter plus the query string that encodes it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingState {
    pub filter: FilterState,
    pub query: QueryParams,
}

impl ListingState {
    pub fn from_query(query: QueryParams) -> Self {
        Self {
            filter: decode(&query),
            query,
        }
    }
}

/// Replace the filter in full and re-encode the query. No merging with the
/// previous filter takes place.
pub fn apply_filter_change(_state: &ListingState, new_filter: FilterState) -> ListingState {
    ListingState {
        query: encode(&new_filter),
        filter: new_filter,
    }
}

/// Where the listing's query string is kept between renders
pub trait QueryLocation: Send + Sync {
    fn read_query(&self) -> Result<QueryParams>;
    fn write_query(&self, query: &QueryParams) -> Result<()>;
}

/// `QueryLocation` held in memory
#[derive(Debug, Default)]
pub struct MemoryLocation {
    query: Mutex<QueryParams>,
}

impl MemoryLocation {
    pub fn new(query: QueryParams) -> Self {
        Self {
            query: Mutex::new(query),
        }
    }
}

impl QueryLocation for MemoryLocation {
    fn read_query(&self) -> Result<QueryParams> {
        Ok(self
            .query
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn write_query(&self, query: &QueryParams) -> Result<()> {
        *self
            .query
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = query.clone();
        Ok(())
    }
}

/// Keeps the filter and the persisted query string in step
pub struct ListingController<L: QueryLocation> {
    location: L,
    state: ListingState,
}

impl<L: QueryLocation> ListingController<L> {
    /// Start from whatever query the location currently holds
    pub fn new(location: L) -> Result<Self> {
        let query = location.read_query()?;
        debug!("Listing starts with query '{}'", query.to_query_string());
        Ok(Self {
            state: ListingState::from_query(query),
            location,
        })
    }

    pub fn filter(&self) -> &FilterState {
        &self.state.filter
    }

    pub fn query(&self) -> &QueryParams {
        &self.state.query
    }

    pub fn location(&self) -> &L {
        &self.location
    }

    /// The location changed underneath us (back button, pasted link)
    pub fn sync_from_location(&mut self) -> Result<()> {
        self.state = ListingState::from_query(self.location.read_query()?);
        Ok(())
    }

    /// Apply a filter submitted by the form: swap it in, persist the encoded
    /// query, then adopt what the location reads back. If persisting fails
    /// the new filter stays in effect and the error is returned.
    pub fn submit_filter(&mut self, new_filter: FilterState) -> Result<()> {
        self.state = apply_filter_change(&self.state, new_filter);
        info!("Filter changed: '{}'", self.state.query.to_query_string());
        self.location.write_query(&self.state.query)?;

        let read_back = ListingState::from_query(self.location.read_query()?);
        if read_back.query != self.state.query {
            warn!(
                "Query read back as '{}', expected '{}'",
                read_back.query.to_query_string(),
                self.state.query.to_query_string()
            );
        }
        self.state = read_back;
        Ok(())
    }

    /// Clear every filter
    pub fn reset(&mut self) -> Result<()> {
        self.submit_filter(FilterState::default())
    }

    pub fn view(&self, snapshot: &CatalogSnapshot) -> ListingView {
        compose(snapshot, &self.state.filter)
    }
}
