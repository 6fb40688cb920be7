//! API handlers for the library REST endpoints

pub mod books;
pub mod borrows;
pub mod health;
pub mod openapi;

use axum::{
    extract::{FromRequest, FromRequestParts},
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use serde::Serialize;
use utoipa::ToSchema;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::ServerConfig,
    error::{AppError, AppResult},
    models::{book::Book, borrow::BorrowRecord, summary::BorrowSummary},
    AppState,
};

/// Success envelope wrapping every response payload
#[derive(Debug, Serialize, ToSchema)]
#[aliases(
    BookResponse = ApiResponse<Book>,
    BookListResponse = ApiResponse<Vec<Book>>,
    BorrowRecordResponse = ApiResponse<BorrowRecord>,
    BorrowSummaryResponse = ApiResponse<Vec<BorrowSummary>>,
    HealthCheckResponse = ApiResponse<health::HealthResponse>
)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

/// JSON body extractor whose rejections use the error envelope
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string extractor whose rejections use the error envelope
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

async fn root() -> &'static str {
    "📚 Library Management API is running!"
}

async fn route_not_found() -> AppResult<()> {
    Err(AppError::NotFound("Route not found".to_string()))
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::AUTHORIZATION]))
        .allow_credentials(true)
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Books (catalog)
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:bookId",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Borrowing
        .route(
            "/borrow-summary",
            get(borrows::borrow_summary).post(borrows::borrow_book),
        );

    Router::new()
        .route("/", get(root))
        .nest("/api", api)
        .fallback(route_not_found)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
