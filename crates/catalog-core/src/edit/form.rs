//! ============================================================================
//! Edit Form - Validation of user-submitted product edits
//! ============================================================================

use serde::{Deserialize, Serialize};

use crate::filter::MAX_DISCOUNT_PERCENT;
use crate::types::{Product, ProductPatch};

pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("Title is required")]
    TitleRequired,

    #[error("Price must be positive")]
    NegativePrice,

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("Rating must be between 0 and 5, got {0}")]
    RatingOutOfRange(f64),

    #[error("Discount percentage must be between 0 and 100, got {0}")]
    DiscountOutOfRange(f64),
}

/// Fields a user may change on the edit screen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditForm {
    pub title: String,
    pub price: f64,
    pub rating: Option<f64>,
    pub discount_percentage: Option<f64>,
    pub description: Option<String>,
}

impl EditForm {
    /// Form pre-filled from the product as currently displayed
    pub fn from_product(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            price: product.price,
            rating: product.rating,
            discount_percentage: product.discount_percentage,
            description: product.description.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), EditError> {
        // Whitespace counts as content; only an empty title is rejected
        if self.title.is_empty() {
            return Err(EditError::TitleRequired);
        }
        if self.price.is_nan() {
            return Err(EditError::NotANumber("Price"));
        }
        if self.price < 0.0 {
            return Err(EditError::NegativePrice);
        }
        if let Some(rating) = self.rating {
            if rating.is_nan() {
                return Err(EditError::NotANumber("Rating"));
            }
            if !(0.0..=MAX_RATING).contains(&rating) {
                return Err(EditError::RatingOutOfRange(rating));
            }
        }
        if let Some(discount) = self.discount_percentage {
            if discount.is_nan() {
                return Err(EditError::NotANumber("Discount percentage"));
            }
            if !(0.0..=MAX_DISCOUNT_PERCENT).contains(&discount) {
                return Err(EditError::DiscountOutOfRange(discount));
            }
        }
        Ok(())
    }

    /// Validate and convert into the patch stored by the overlay
    pub fn into_patch(self) -> Result<ProductPatch, EditError> {
        self.validate()?;
        Ok(ProductPatch {
            title: Some(self.title),
            price: Some(self.price),
            rating: self.rating,
            discount_percentage: self.discount_percentage,
            description: self.description,
            ..Default::default()
        })
    }
}
