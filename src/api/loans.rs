//! Loan management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::loan::{BorrowRequest, LoanDetails, LoanQuery},
};

use super::AuthenticatedUser;

/// Create loan request
#[derive(Deserialize, ToSchema)]
pub struct CreateLoanRequest {
    /// Borrowing user ID
    pub user_id: i32,
    /// Book ID
    pub book_id: i32,
    /// Due date, must be after today (ISO 8601 date)
    pub due_date: NaiveDate,
}

/// Paginated loan list
#[derive(Serialize, ToSchema)]
pub struct LoansListResponse {
    pub items: Vec<LoanDetails>,
    pub total: i64,
}

/// List all loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Loans matching the filters", body = LoansListResponse),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<LoansListResponse>> {
    claims.require_admin()?;

    let (items, total) = state.services.borrowing.list_loans(&query).await?;
    Ok(Json(LoansListResponse { items, total }))
}

/// Get a single loan
#[utoipa::path(
    get,
    path = "/loans/{id}",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Loan details", body = LoanDetails),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn get_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.borrowing.get_loan(loan_id).await?;

    let owner_id = loan.user.as_ref().map(|u| u.id).unwrap_or(-1);
    claims.require_self_or_staff(owner_id)?;

    Ok(Json(loan))
}

/// Borrow a book
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = LoanDetails),
        (status = 400, description = "Book unavailable or duplicate open loan"),
        (status = 403, description = "User is blocked"),
        (status = 404, description = "User or book not found"),
        (status = 422, description = "Invalid due date")
    )
)]
pub async fn create_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateLoanRequest>,
) -> AppResult<(StatusCode, Json<LoanDetails>)> {
    claims.require_self_or_staff(request.user_id)?;

    let borrow = BorrowRequest {
        user_id: request.user_id,
        book_id: request.book_id,
        due_date: request.due_date,
    };

    let loan = state.services.borrowing.borrow(&borrow).await?;

    Ok((StatusCode::CREATED, Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/loans/{id}/return",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = LoanDetails),
        (status = 400, description = "Already returned"),
        (status = 404, description = "Loan not found")
    )
)]
pub async fn return_loan(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(loan_id): Path<i32>,
) -> AppResult<Json<LoanDetails>> {
    let loan = state.services.borrowing.get_loan(loan_id).await?;
    let owner_id = loan.user.as_ref().map(|u| u.id).unwrap_or(-1);
    claims.require_self_or_staff(owner_id)?;

    let returned = state.services.borrowing.return_loan(loan_id).await?;
    Ok(Json(returned))
}

/// Get loans for a specific user
#[utoipa::path(
    get,
    path = "/users/{id}/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID"),
        LoanQuery
    ),
    responses(
        (status = 200, description = "User's loans", body = LoansListResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(user_id): Path<i32>,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<LoansListResponse>> {
    claims.require_self_or_staff(user_id)?;

    let (items, total) = state.services.borrowing.user_loans(user_id, &query).await?;
    Ok(Json(LoansListResponse { items, total }))
}

/// Get the authenticated user's own loans
#[utoipa::path(
    get,
    path = "/my/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(LoanQuery),
    responses(
        (status = 200, description = "Own loans", body = LoansListResponse)
    )
)]
pub async fn my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<LoanQuery>,
) -> AppResult<Json<LoansListResponse>> {
    let (items, total) = state
        .services
        .borrowing
        .user_loans(claims.user_id, &query)
        .await?;
    Ok(Json(LoansListResponse { items, total }))
}
