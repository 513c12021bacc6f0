//! ============================================================================
//! Filter State - The structured filter a listing is narrowed by
//! ============================================================================
//! A `FilterState` is replaced wholesale on every change, never patched.
//! The closed set of fields is enumerated by `FilterField`, which the query
//! codec matches over exhaustively.
//! ============================================================================

use serde::{Deserialize, Serialize};

use super::query::parse_decimal;

/// Rating choices offered by the filter form, highest first
pub const RATING_CHOICES: [&str; 4] = ["4", "3", "2", "1"];

/// Upper bound of a discount percentage
pub const MAX_DISCOUNT_PERCENT: f64 = 100.0;

/// Every field of a filter, in query-string order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterField {
    Search,
    Categories,
    MinPrice,
    MaxPrice,
    Rating,
    DiscountedOnly,
    MinDiscountPercent,
}

impl FilterField {
    pub const ALL: [FilterField; 7] = [
        FilterField::Search,
        FilterField::Categories,
        FilterField::MinPrice,
        FilterField::MaxPrice,
        FilterField::Rating,
        FilterField::DiscountedOnly,
        FilterField::MinDiscountPercent,
    ];

    /// Query-string parameter name
    pub fn key(&self) -> &'static str {
        match self {
            FilterField::Search => "search",
            FilterField::Categories => "categories",
            FilterField::MinPrice => "minPrice",
            FilterField::MaxPrice => "maxPrice",
            FilterField::Rating => "rating",
            FilterField::DiscountedOnly => "discountedOnly",
            FilterField::MinDiscountPercent => "minDiscountPercent",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

/// Selected categories. Membership is what matters: equality ignores order
/// and duplicates are dropped on insert. Insertion order is kept so the
/// encoded query string reads the way the user picked them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategorySet(Vec<String>);

impl CategorySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the category was already selected
    pub fn insert(&mut self, category: impl Into<String>) -> bool {
        let category = category.into();
        if self.contains(&category) {
            return false;
        }
        self.0.push(category);
        true
    }

    pub fn remove(&mut self, category: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|c| c != category);
        self.0.len() != before
    }

    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|c| c == category)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn join(&self, separator: &str) -> String {
        self.0.join(separator)
    }
}

impl PartialEq for CategorySet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|c| other.contains(c))
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = CategorySet::new();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

/// Minimum star rating, kept as the raw text the form or URL supplied.
/// An empty value means "any rating".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinRating(String);

impl MinRating {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Numeric threshold. Text that is not a number yields NaN, which no
    /// present rating satisfies.
    pub fn threshold(&self) -> f64 {
        parse_decimal(&self.0)
    }
}

/// Validation failures of a submitted filter form
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    #[error("{} must be a number", .0.key())]
    NotANumber(FilterField),

    #[error("{} must be at least 0, got {value}", .field.key())]
    Negative { field: FilterField, value: f64 },

    #[error("Max price must be greater than or equal to min price ({max} < {min})")]
    PriceRange { min: f64, max: f64 },

    #[error("Minimum discount must be between 0 and 100, got {0}")]
    DiscountOutOfRange(f64),

    #[error("Unknown rating '{0}'. Valid values: 1, 2, 3, 4")]
    UnknownRating(String),
}

/// The active filter of a listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    pub search: Option<String>,
    pub categories: CategorySet,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub rating: Option<MinRating>,
    pub discounted_only: bool,
    /// Only consulted when `discounted_only` is set
    pub min_discount_percent: Option<f64>,
}

impl FilterState {
    /// True when no clause would exclude anything
    pub fn is_empty(&self) -> bool {
        self.search.as_deref().map_or(true, str::is_empty)
            && self.categories.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.rating.as_ref().map_or(true, MinRating::is_empty)
            && !self.discounted_only
    }

    /// Select the category if absent, deselect it if present
    pub fn toggle_category(&mut self, category: &str) {
        if !self.categories.remove(category) {
            self.categories.insert(category);
        }
    }

    /// Check the form rules: non-negative prices, max >= min, discount
    /// within 0..=100, rating one of the offered choices.
    /// Decoding a query string never validates.
    pub fn validate(&self) -> Result<(), FilterError> {
        for (field, value) in [
            (FilterField::MinPrice, self.min_price),
            (FilterField::MaxPrice, self.max_price),
            (FilterField::MinDiscountPercent, self.min_discount_percent),
        ] {
            if let Some(v) = value {
                if v.is_nan() {
                    return Err(FilterError::NotANumber(field));
                }
                if v < 0.0 {
                    return Err(FilterError::Negative { field, value: v });
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if max < min {
                return Err(FilterError::PriceRange { min, max });
            }
        }

        if let Some(discount) = self.min_discount_percent {
            if discount > MAX_DISCOUNT_PERCENT {
                return Err(FilterError::DiscountOutOfRange(discount));
            }
        }

        if let Some(rating) = &self.rating {
            if !rating.is_empty() && !RATING_CHOICES.contains(&rating.as_str()) {
                return Err(FilterError::UnknownRating(rating.as_str().to_string()));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_keys_round_trip() {
        for field in FilterField::ALL {
            assert_eq!(FilterField::from_key(field.key()), Some(field));
        }
        assert_eq!(FilterField::from_key("page"), None);
    }

    #[test]
    fn test_category_set_equality_ignores_order() {
        let a: CategorySet = ["Shoes", "Hats"].into_iter().collect();
        let b: CategorySet = ["Hats", "Shoes", "Hats"].into_iter().collect();
        assert_eq!(a, b);
        assert_eq!(b.len(), 2);
        assert_eq!(a.join(","), "Shoes,Hats");
    }

    #[test]
    fn test_toggle_category() {
        let mut filter = FilterState::default();
        filter.toggle_category("Shoes");
        filter.toggle_category("Hats");
        assert!(filter.categories.contains("Shoes"));
        filter.toggle_category("Shoes");
        assert!(!filter.categories.contains("Shoes"));
        assert_eq!(filter.categories.len(), 1);
    }

    #[test]
    fn test_is_empty() {
        assert!(FilterState::default().is_empty());

        let filter = FilterState {
            search: Some(String::new()),
            rating: Some(MinRating::new("")),
            min_discount_percent: Some(10.0),
            ..Default::default()
        };
        // min discount alone is inert without discounted_only
        assert!(filter.is_empty());

        let filter = FilterState {
            discounted_only: true,
            ..Default::default()
        };
        assert!(!filter.is_empty());
    }

    #[test]
    fn test_validate_price_range() {
        let filter = FilterState {
            min_price: Some(50.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        assert_eq!(
            filter.validate(),
            Err(FilterError::PriceRange { min: 50.0, max: 20.0 })
        );

        let filter = FilterState {
            min_price: Some(20.0),
            max_price: Some(20.0),
            ..Default::default()
        };
        assert!(filter.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_numbers() {
        let filter = FilterState {
            min_price: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            filter.validate(),
            Err(FilterError::Negative { field: FilterField::MinPrice, .. })
        ));

        let filter = FilterState {
            max_price: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(
            filter.validate(),
            Err(FilterError::NotANumber(FilterField::MaxPrice))
        );

        let filter = FilterState {
            min_discount_percent: Some(150.0),
            ..Default::default()
        };
        assert_eq!(filter.validate(), Err(FilterError::DiscountOutOfRange(150.0)));
    }

    #[test]
    fn test_validate_rating_choices() {
        for choice in RATING_CHOICES {
            let filter = FilterState {
                rating: Some(MinRating::new(choice)),
                ..Default::default()
            };
            assert!(filter.validate().is_ok());
        }

        let filter = FilterState {
            rating: Some(MinRating::new("5")),
            ..Default::default()
        };
        assert_eq!(filter.validate(), Err(FilterError::UnknownRating("5".into())));
    }

    #[test]
    fn test_rating_threshold() {
        assert_eq!(MinRating::new("3").threshold(), 3.0);
        assert!(MinRating::new("three").threshold().is_nan());
    }
}
