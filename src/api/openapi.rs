//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{books, borrows, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Management API",
        version = "1.0.0",
        description = "Books, borrowers and borrow transactions. Every response is wrapped in \
                       `{ success, message, data }`; failures add `error`."
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Books
        books::list_books,
        books::get_book,
        books::create_book,
        books::update_book,
        books::delete_book,
        // Borrows
        borrows::borrow_book,
        borrows::borrow_summary,
    ),
    components(
        schemas(
            // Books
            crate::models::book::Book,
            crate::models::book::Genre,
            crate::models::book::CreateBook,
            crate::models::book::UpdateBook,
            // Borrows
            crate::models::borrow::BorrowRequest,
            crate::models::borrow::BorrowRecord,
            crate::models::borrower::Borrower,
            crate::models::summary::BorrowSummary,
            crate::models::summary::BookSummary,
            // Health
            health::HealthResponse,
            // Envelopes
            crate::api::BookResponse,
            crate::api::BookListResponse,
            crate::api::BorrowRecordResponse,
            crate::api::BorrowSummaryResponse,
            crate::api::HealthCheckResponse,
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "books", description = "Book catalog management"),
        (name = "borrows", description = "Borrow transactions and summary")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
