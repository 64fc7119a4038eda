//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    api,
    error::ErrorResponse,
    models::{
        book::{Book, BookShort, CreateBook, UpdateBook},
        loan::{LoanDetails, LoanStatus},
        user::{CreateUser, UpdateBlocked, User, UserShort},
    },
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Biblius API",
        description = "Library lending management REST API"
    ),
    paths(
        api::health::health_check,
        api::health::readiness_check,
        api::books::list_books,
        api::books::get_book,
        api::books::create_book,
        api::books::update_book,
        api::books::delete_book,
        api::users::list_users,
        api::users::create_user,
        api::users::get_user,
        api::users::set_blocked,
        api::loans::list_loans,
        api::loans::get_loan,
        api::loans::create_loan,
        api::loans::return_loan,
        api::loans::get_user_loans,
        api::loans::my_loans,
        api::stats::get_stats,
    ),
    components(schemas(
        Book,
        BookShort,
        CreateBook,
        UpdateBook,
        User,
        UserShort,
        CreateUser,
        UpdateBlocked,
        LoanDetails,
        LoanStatus,
        ErrorResponse,
        api::health::HealthResponse,
        api::books::BooksListResponse,
        api::users::UsersListResponse,
        api::loans::CreateLoanRequest,
        api::loans::LoansListResponse,
        api::stats::LoanCounts,
        api::stats::StatsResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Service health"),
        (name = "books", description = "Book catalog"),
        (name = "users", description = "User management"),
        (name = "loans", description = "Borrowing and returns"),
        (name = "stats", description = "Library statistics")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Router serving the Swagger UI and the OpenAPI document
pub fn create_openapi_router() -> Router {
    Router::new().merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
