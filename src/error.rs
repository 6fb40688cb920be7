//! Error types for the library server

use std::collections::BTreeMap;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// A required input field that was absent, null or blank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingField {
    /// Wire name of the field
    pub path: &'static str,
    /// Human readable label used in the error message
    pub label: &'static str,
}

/// Input rejected before any store mutation happened
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("missing required fields: {}", .0.iter().map(|f| f.path).collect::<Vec<_>>().join(", "))]
    MissingFields(Vec<MissingField>),

    #[error("quantity must be a positive number, got {0}")]
    InvalidQuantity(i64),

    #[error("{field} must be of type {expected}, got {value}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
        value: Value,
    },

    #[error("{field} is not a valid date: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("not enough copies available ({copies} left)")]
    InsufficientStock { copies: i32 },

    #[error("{field} {value} already exists")]
    Duplicate { field: &'static str, value: String },

    #[error("{0}")]
    Fields(#[from] validator::ValidationErrors),
}

impl ValidationError {
    /// Envelope message for this failure
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::InvalidQuantity(_) => "Negative or zero quantity cannot be borrowed",
            ValidationError::InsufficientStock { .. } => "Cannot borrow more than available copies",
            _ => "Validation failed",
        }
    }

    /// Structured `{name, errors}` payload, keyed by field path
    pub fn details(&self) -> Value {
        let mut errors = BTreeMap::new();

        match self {
            ValidationError::MissingFields(fields) => {
                for field in fields {
                    errors.insert(
                        field.path.to_string(),
                        json!({
                            "message": format!("{} is required", field.label),
                            "kind": "required",
                            "path": field.path,
                        }),
                    );
                }
            }
            ValidationError::InvalidQuantity(value) => {
                errors.insert(
                    "quantity".to_string(),
                    json!({
                        "message": "Quantity must be a positive number",
                        "kind": "min",
                        "path": "quantity",
                        "value": value,
                        "min": 1,
                    }),
                );
            }
            ValidationError::InvalidType {
                field,
                expected,
                value,
            } => {
                errors.insert(
                    field.to_string(),
                    json!({
                        "message": format!("{} must be of type {}", field, expected),
                        "kind": expected,
                        "path": field,
                        "value": value,
                    }),
                );
            }
            ValidationError::InvalidDate { field, value } => {
                errors.insert(
                    field.to_string(),
                    json!({
                        "message": format!("{} must be a valid date", field),
                        "kind": "date",
                        "path": field,
                        "value": value,
                    }),
                );
            }
            ValidationError::InsufficientStock { copies } => {
                errors.insert(
                    "copies".to_string(),
                    json!({
                        "message": "Not enough copies available",
                        "kind": "min",
                        "path": "copies",
                        "value": copies,
                        "min": 0,
                    }),
                );
            }
            ValidationError::Duplicate { field, value } => {
                errors.insert(
                    field.to_string(),
                    json!({
                        "message": format!("A book with {} {} already exists", field, value),
                        "kind": "unique",
                        "path": field,
                        "value": value,
                    }),
                );
            }
            ValidationError::Fields(validation) => {
                for (field, field_errors) in validation.field_errors() {
                    let Some(first) = field_errors.first() else {
                        continue;
                    };
                    let message = first
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{} is invalid", field));
                    let mut entry = json!({
                        "message": message,
                        "kind": first.code.to_string(),
                        "path": field.to_string(),
                    });
                    if let Some(value) = first.params.get("value") {
                        entry["value"] = value.clone();
                    }
                    if let Some(min) = first.params.get("min") {
                        entry["min"] = min.clone();
                    }
                    errors.insert(field.to_string(), entry);
                }
            }
        }

        json!({
            "name": "ValidationError",
            "errors": errors,
        })
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn book_not_found() -> Self {
        AppError::NotFound("Book not found".to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(ValidationError::Fields(errors))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Error envelope returned for every failed request
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[schema(value_type = Option<Object>)]
    pub data: Option<Value>,
    #[schema(value_type = Option<Object>)]
    pub error: Option<Value>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message, error) = match &self {
            AppError::Validation(validation) => (
                StatusCode::BAD_REQUEST,
                validation.message().to_string(),
                Some(validation.details()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                "Invalid request".to_string(),
                Some(json!({ "name": "BadRequest", "message": msg })),
            ),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            success: false,
            message,
            data: None,
            error,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
