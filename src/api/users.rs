//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::user::{CreateUser, UpdateBlocked, User, UserQuery},
};

use super::AuthenticatedUser;

/// Paginated user list
#[derive(Serialize, ToSchema)]
pub struct UsersListResponse {
    pub items: Vec<User>,
    pub total: i64,
}

/// List users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "Users matching the filters", body = UsersListResponse),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<UsersListResponse>> {
    claims.require_admin()?;

    let (items, total) = state.services.users.list_users(&query).await?;
    Ok(Json(UsersListResponse { items, total }))
}

/// Provision a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 403, description = "Admin privileges required"),
        (status = 422, description = "Validation error")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    claims.require_admin()?;
    request.validate()?;

    let user = state.services.users.create_user(&request).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a single user
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = User),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let user = state.services.users.get_user(id).await?;
    Ok(Json(user))
}

/// Block or unblock a user
#[utoipa::path(
    put,
    path = "/users/{id}/blocked",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateBlocked,
    responses(
        (status = 200, description = "Blocked flag updated", body = User),
        (status = 403, description = "Admin privileges required"),
        (status = 404, description = "User not found")
    )
)]
pub async fn set_blocked(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateBlocked>,
) -> AppResult<Json<User>> {
    claims.require_admin()?;

    let user = state
        .services
        .users
        .set_blocked(id, request.is_blocked)
        .await?;
    Ok(Json(user))
}
