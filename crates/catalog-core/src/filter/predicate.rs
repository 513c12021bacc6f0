//! ============================================================================
//! Product Filter - Predicate built from a FilterState
//! ============================================================================
//! All clauses are conjunctive. An unset clause passes every product.
//! ============================================================================

use crate::types::Product;

use super::state::{FilterField, FilterState};

/// Compiled form of a `FilterState`, evaluated against one product at a time
#[derive(Debug, Clone)]
pub struct ProductFilter {
    search: Option<String>,
    categories: Vec<String>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    min_rating: Option<f64>,
    discounted_only: bool,
    min_discount_percent: Option<f64>,
}

impl ProductFilter {
    pub fn new(filter: &FilterState) -> Self {
        Self {
            search: filter
                .search
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase),
            categories: filter.categories.iter().map(str::to_string).collect(),
            min_price: filter.min_price,
            max_price: filter.max_price,
            min_rating: filter
                .rating
                .as_ref()
                .filter(|r| !r.is_empty())
                .map(|r| r.threshold()),
            discounted_only: filter.discounted_only,
            min_discount_percent: filter
                .min_discount_percent
                .filter(|_| filter.discounted_only),
        }
    }

    pub fn matches(&self, product: &Product) -> bool {
        self.first_failing(product).is_none()
    }

    /// The first clause, in field order, that rejects `product`
    pub fn first_failing(&self, product: &Product) -> Option<FilterField> {
        FilterField::ALL
            .into_iter()
            .find(|field| !self.clause_passes(*field, product))
    }

    fn clause_passes(&self, field: FilterField, product: &Product) -> bool {
        match field {
            FilterField::Search => self
                .search
                .as_ref()
                .map_or(true, |needle| product.title.to_lowercase().contains(needle)),
            FilterField::Categories => {
                self.categories.is_empty() || self.categories.contains(&product.category)
            }
            FilterField::MinPrice => self.min_price.map_or(true, |min| product.price >= min),
            FilterField::MaxPrice => self.max_price.map_or(true, |max| product.price <= max),
            // Unrated products are never excluded by the rating clause
            FilterField::Rating => match (self.min_rating, product.rating) {
                (Some(threshold), Some(rating)) => rating >= threshold,
                _ => true,
            },
            FilterField::DiscountedOnly => {
                !self.discounted_only || product.discount_percentage.map_or(false, |d| d > 0.0)
            }
            // Unlike the rating clause, a missing (or zero) discount fails here
            FilterField::MinDiscountPercent => match self.min_discount_percent {
                None => true,
                Some(min) => product
                    .discount_percentage
                    .map_or(false, |d| d != 0.0 && !d.is_nan() && d >= min),
            },
        }
    }
}

impl FilterState {
    /// Build the predicate for this filter
    pub fn predicate(&self) -> ProductFilter {
        ProductFilter::new(self)
    }
}
