//! Review entities and validation.

mod ledger;

pub use ledger::ReviewLedger;

use chrono::{DateTime, Utc};
use common::{CustomerId, ProductId, ReviewId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::storage::StorageError;

/// Minimum accepted comment length, in characters, after trimming.
pub const MIN_COMMENT_LEN: usize = 5;

/// Errors from review validation and ledger operations.
#[derive(Debug, Error)]
pub enum ReviewError {
    /// Rating outside the 1–5 range.
    #[error("rating must be between 1 and 5, got {rating}")]
    RatingOutOfRange { rating: u8 },

    /// Comment shorter than the configured minimum.
    #[error("comment must be at least {min} characters, got {len}")]
    CommentTooShort { len: usize, min: usize },

    /// The reviewed product does not exist.
    #[error("product not found: {0}")]
    UnknownProduct(ProductId),

    /// The underlying store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A draft review submitted for creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    /// Integer star rating, 1–5 inclusive.
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    /// Validates rating range and comment length.
    pub fn validate(&self) -> Result<(), ReviewError> {
        if !(1..=5).contains(&self.rating) {
            return Err(ReviewError::RatingOutOfRange {
                rating: self.rating,
            });
        }
        let len = self.comment.trim().chars().count();
        if len < MIN_COMMENT_LEN {
            return Err(ReviewError::CommentTooShort {
                len,
                min: MIN_COMMENT_LEN,
            });
        }
        Ok(())
    }
}

/// A persisted review. Never mutated; deleted only to compensate a failed
/// aggregate write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Materializes a validated draft.
    pub fn from_draft(draft: NewReview, now: DateTime<Utc>) -> Result<Self, ReviewError> {
        draft.validate()?;
        Ok(Self {
            id: ReviewId::new(),
            product_id: draft.product_id,
            customer_id: draft.customer_id,
            customer_name: draft.customer_name,
            rating: draft.rating,
            comment: draft.comment,
            created_at: now,
        })
    }
}
