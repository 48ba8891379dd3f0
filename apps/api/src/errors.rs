use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::compositor::CompositionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
///
/// External-dependency failures (`Generation`, `Illustration`) are surfaced
/// immediately without retries; callers may retry with backoff.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unknown book type: {0}")]
    UnknownBookType(String),

    #[error("Narrative generation failed: {0}")]
    Generation(String),

    #[error("Illustration failed for page {page}: {message}")]
    Illustration { page: usize, message: String },

    #[error("Page composition failed: {0}")]
    Composition(#[from] CompositionError),

    #[error("Payment verification failed: {0}")]
    Payment(String),

    #[error("Print order failed: {0}")]
    PrintOrder(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UnknownBookType(slug) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNKNOWN_BOOK_TYPE",
                format!("Unknown book type: {slug}"),
            ),
            AppError::Generation(msg) => {
                tracing::error!("Narrative generation error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "GENERATION_ERROR",
                    "Story generation failed".to_string(),
                )
            }
            AppError::Illustration { page, message } => {
                tracing::error!("Illustration error on page {page}: {message}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "ILLUSTRATION_ERROR",
                    format!("Illustration generation failed for page {page}"),
                )
            }
            AppError::Composition(e) => {
                tracing::error!("Composition error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "COMPOSITION_ERROR",
                    "Page rendering failed".to_string(),
                )
            }
            AppError::Payment(msg) => {
                (StatusCode::PAYMENT_REQUIRED, "PAYMENT_ERROR", msg.clone())
            }
            AppError::PrintOrder(msg) => {
                tracing::error!("Print order error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PRINT_ORDER_ERROR",
                    "Print fulfillment request failed".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
