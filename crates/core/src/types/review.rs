//! Product reviews and review submission.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{ProductId, ReviewId};

/// Errors that can occur when validating a [`ReviewDraft`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewDraftError {
    /// The comment is empty or whitespace only.
    #[error("Please write a review")]
    EmptyComment,
    /// The star rating is outside 1-5.
    #[error("rating must be between {min} and {max} (got {rating})")]
    RatingOutOfRange {
        rating: u8,
        min: u8,
        max: u8,
    },
}

/// A published review, newest first when listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub product_id: ProductId,
    #[serde(default)]
    pub user_name: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// A review being composed on the product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewDraft {
    pub rating: u8,
    pub comment: String,
}

impl Default for ReviewDraft {
    fn default() -> Self {
        Self {
            rating: Self::MAX_RATING,
            comment: String::new(),
        }
    }
}

impl ReviewDraft {
    /// Lowest selectable star rating.
    pub const MIN_RATING: u8 = 1;
    /// Highest selectable star rating.
    pub const MAX_RATING: u8 = 5;

    /// Create a draft with the given rating and comment.
    #[must_use]
    pub fn new(rating: u8, comment: impl Into<String>) -> Self {
        Self {
            rating,
            comment: comment.into(),
        }
    }

    /// Validate the draft and produce the request body for `POST /reviews`.
    ///
    /// # Errors
    ///
    /// Returns an error if the comment is blank or the rating is outside 1-5.
    pub fn into_submission(
        self,
        product_id: ProductId,
    ) -> Result<ReviewSubmission, ReviewDraftError> {
        if !(Self::MIN_RATING..=Self::MAX_RATING).contains(&self.rating) {
            return Err(ReviewDraftError::RatingOutOfRange {
                rating: self.rating,
                min: Self::MIN_RATING,
                max: Self::MAX_RATING,
            });
        }

        let comment = self.comment.trim();
        if comment.is_empty() {
            return Err(ReviewDraftError::EmptyComment);
        }

        Ok(ReviewSubmission {
            product_id,
            rating: self.rating,
            comment: comment.to_owned(),
        })
    }
}

/// Request body for `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSubmission {
    pub product_id: ProductId,
    pub rating: u8,
    pub comment: String,
}

/// Response body for `POST /reviews`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewReceipt {
    pub message: String,
    pub id: ReviewId,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_draft_is_five_stars() {
        let draft = ReviewDraft::default();
        assert_eq!(draft.rating, 5);
        assert!(draft.comment.is_empty());
    }

    #[test]
    fn test_blank_comment_rejected() {
        let result = ReviewDraft::new(4, "   \n").into_submission(ProductId::new("p1"));
        assert_eq!(result, Err(ReviewDraftError::EmptyComment));
    }

    #[test]
    fn test_rating_out_of_range_rejected() {
        let result = ReviewDraft::new(0, "fine").into_submission(ProductId::new("p1"));
        assert!(matches!(
            result,
            Err(ReviewDraftError::RatingOutOfRange { rating: 0, .. })
        ));
    }

    #[test]
    fn test_submission_trims_comment() {
        let submission = ReviewDraft::new(4, "  Great output  ")
            .into_submission(ProductId::new("p1"))
            .unwrap();
        assert_eq!(submission.comment, "Great output");
        assert_eq!(submission.rating, 4);
    }

    #[test]
    fn test_review_parses_backend_timestamp() {
        let json = r#"{
            "id": "r1",
            "product_id": "p1",
            "user_id": "u1",
            "user_name": "Asha",
            "rating": 5,
            "comment": "Excellent",
            "created_at": "2025-03-04T10:20:30.123456+00:00"
        }"#;
        let review: Review = serde_json::from_str(json).unwrap();
        assert_eq!(review.user_name, "Asha");
        assert_eq!(review.created_at.timestamp(), 1_741_083_630);
    }
}
