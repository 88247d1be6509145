use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// 评论实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub header: String,
    pub content: String,
    pub date: DateTime<Utc>,
    pub product_id: i64,
    pub is_hidden: bool,
}

/// Caller-supplied fields for a new review.
///
/// `id`, `date` and `isHidden` are server-assigned; serde drops them if a
/// client sends them anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReview {
    pub header: String,
    pub content: String,
    pub product_id: i64,
}

impl NewReview {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.header.trim().is_empty() {
            errors.push(FieldError::new("header", "The header field is required."));
        }
        if self.content.trim().is_empty() {
            errors.push(FieldError::new("content", "The content field is required."));
        }
        if self.product_id < 1 {
            errors.push(FieldError::new(
                "productId",
                "The productId field must be at least 1.",
            ));
        }
        errors
    }

    /// Materializes the record handed to the store; the store assigns the id.
    pub fn into_review(self, date: DateTime<Utc>) -> Review {
        Review {
            id: 0,
            header: self.header,
            content: self.content,
            date,
            product_id: self.product_id,
            is_hidden: false,
        }
    }
}

/// The only part of a review that may change after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewVisibility {
    pub is_hidden: bool,
}

impl From<&Review> for ReviewVisibility {
    fn from(review: &Review) -> Self {
        Self {
            is_hidden: review.is_hidden,
        }
    }
}

impl ReviewVisibility {
    pub fn apply_to(self, review: &mut Review) {
        review.is_hidden = self.is_hidden;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
