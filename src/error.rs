//! Error types for Biblius server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Machine-readable application error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchUser = 4,
    NoSuchBook = 5,
    NoSuchLoan = 6,
    UserBlocked = 7,
    BookUnavailable = 8,
    DuplicateLoan = 9,
    AlreadyReturned = 10,
    BadValue = 11,
    ConflictRetry = 12,
    InvariantBroken = 13,
    BookHasOpenLoans = 14,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("User with id {0} not found")]
    UserNotFound(i32),

    #[error("Book with id {0} not found")]
    BookNotFound(i32),

    #[error("Loan with id {0} not found")]
    LoanNotFound(i32),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("User {0} is blocked and cannot borrow books")]
    UserBlocked(i32),

    #[error("Book {0} has no available copies")]
    BookUnavailable(i32),

    #[error("User {user_id} already has an open loan for book {book_id}")]
    DuplicateLoan { user_id: i32, book_id: i32 },

    #[error("Loan {0} has already been returned")]
    AlreadyReturned(i32),

    #[error("Book {0} still has open loans")]
    BookHasOpenLoans(i32),

    #[error("Conflicting concurrent update: {0}")]
    Conflict(String),

    #[error("Inventory invariant broken: {0}")]
    Invariant(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::UserNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchUser, self.to_string())
            }
            AppError::BookNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchBook, self.to_string())
            }
            AppError::LoanNotFound(_) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchLoan, self.to_string())
            }
            AppError::Validation(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, ErrorCode::BadValue, msg.clone())
            }
            AppError::UserBlocked(_) => {
                (StatusCode::FORBIDDEN, ErrorCode::UserBlocked, self.to_string())
            }
            AppError::BookUnavailable(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BookUnavailable, self.to_string())
            }
            AppError::DuplicateLoan { .. } => {
                (StatusCode::BAD_REQUEST, ErrorCode::DuplicateLoan, self.to_string())
            }
            AppError::AlreadyReturned(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::AlreadyReturned, self.to_string())
            }
            AppError::BookHasOpenLoans(_) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BookHasOpenLoans, self.to_string())
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::ConflictRetry, msg.clone())
            }
            AppError::Invariant(msg) => {
                tracing::error!("Invariant broken: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::InvariantBroken,
                    "Internal consistency error".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_rule_violations_map_to_client_errors() {
        assert_eq!(
            AppError::UserBlocked(1).into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::BookUnavailable(1).into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::DuplicateLoan { user_id: 1, book_id: 2 }
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::AlreadyReturned(1).into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn lookups_and_validation_map_to_404_and_422() {
        assert_eq!(
            AppError::BookNotFound(42).into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Validation("due_date must be in the future".into())
                .into_response()
                .status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Conflict("retries exhausted".into())
                .into_response()
                .status(),
            StatusCode::CONFLICT
        );
    }
}
