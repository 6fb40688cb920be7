//! Borrow transaction and summary endpoints

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    error::AppResult,
    models::{
        borrow::{BorrowRecord, BorrowRequest},
        summary::BorrowSummary,
    },
    AppState,
};

use super::{ApiJson, ApiResponse};

/// Borrow copies of a book
#[utoipa::path(
    post,
    path = "/api/borrow-summary",
    tag = "borrows",
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Book borrowed (enveloped)", body = crate::api::BorrowRecordResponse),
        (status = 400, description = "Missing fields, invalid quantity or not enough copies", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn borrow_book(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BorrowRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<BorrowRecord>>)> {
    let record = state.services.borrows.borrow(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new("Book borrowed successfully", record)),
    ))
}

/// Total quantity borrowed per book
#[utoipa::path(
    get,
    path = "/api/borrow-summary",
    tag = "borrows",
    responses(
        (status = 200, description = "Borrowed books summary (enveloped)", body = crate::api::BorrowSummaryResponse)
    )
)]
pub async fn borrow_summary(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<Vec<BorrowSummary>>>> {
    let summary = state.services.summary.summarize().await?;
    Ok(Json(ApiResponse::new(
        "Borrowed books summary retrieved successfully",
        summary,
    )))
}
