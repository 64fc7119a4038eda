//! Statistics endpoints

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;

use super::AuthenticatedUser;

/// Open/overdue loan counts
#[derive(Serialize, ToSchema)]
pub struct LoanCounts {
    pub open: i64,
    pub overdue: i64,
}

/// Library snapshot counts
#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub books: i64,
    pub users: i64,
    pub loans: LoanCounts,
}

/// Get library statistics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Snapshot counts", body = StatsResponse),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
) -> AppResult<Json<StatsResponse>> {
    claims.require_staff()?;

    let stats = state.services.stats.get_stats().await?;
    Ok(Json(stats))
}
