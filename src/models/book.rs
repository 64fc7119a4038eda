//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Book model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub published_year: i32,
    pub description: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// True iff at least one copy is not tied to an open loan
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }
}

/// Short book representation nested in loan responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub available_copies: i32,
    pub total_copies: i32,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: String,
    #[validate(length(min = 10, max = 20, message = "ISBN must be 10-20 characters"))]
    pub isbn: String,
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: String,
    #[validate(range(min = 1000, max = 2100, message = "Published year out of range"))]
    pub published_year: i32,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub total_copies: i32,
}

/// Update book request.
///
/// `available_copies` is deliberately absent: availability only changes
/// through borrow/return, or proportionally when `total_copies` is resized.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Author must be 1-255 characters"))]
    pub author: Option<String>,
    #[validate(length(min = 10, max = 20, message = "ISBN must be 10-20 characters"))]
    pub isbn: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Category must be 1-100 characters"))]
    pub category: Option<String>,
    #[validate(range(min = 1000, max = 2100, message = "Published year out of range"))]
    pub published_year: Option<i32>,
    pub description: Option<String>,
    #[validate(range(min = 1, message = "At least one copy is required"))]
    pub total_copies: Option<i32>,
}

/// Book query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct BookQuery {
    /// Filter by exact category
    pub category: Option<String>,
    /// Only books with available copies
    pub available: Option<bool>,
    /// Substring match on title, author or ISBN
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// New available-copy count after `total_copies` is resized.
///
/// The available count moves by the same delta as the total, clamped to
/// `[0, new_total]`.
pub fn resized_available(available: i32, old_total: i32, new_total: i32) -> i32 {
    (available + (new_total - old_total)).clamp(0, new_total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn growing_total_grows_available_by_same_delta() {
        assert_eq!(resized_available(2, 5, 8), 5);
    }

    #[test]
    fn shrinking_total_clamps_available_at_zero() {
        // 1 available of 5, shrink to 2: delta -3 would go negative
        assert_eq!(resized_available(1, 5, 2), 0);
    }

    #[test]
    fn available_never_exceeds_new_total() {
        assert_eq!(resized_available(5, 5, 3), 3);
    }

    #[test]
    fn unchanged_total_keeps_available() {
        assert_eq!(resized_available(3, 5, 5), 3);
    }
}
