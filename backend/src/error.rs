//! Error handling for the Tablet Production Tracking Platform
//!
//! Maps the engine's error taxonomy onto consistent JSON error responses.
//! Ambiguous matches and over-delivery are ordinary persisted states, not
//! errors; only validation, cross-product receipts, duplicate pushes,
//! conflicts and missing records surface here as failures.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::CrossProductReceipt;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error(transparent)]
    CrossProductReceipt(#[from] CrossProductReceipt),

    #[error("Bag already pushed: {0}")]
    DuplicatePush(String),

    #[error("Concurrent update conflict: {0}")]
    ConcurrencyConflict(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    // External service errors
    #[error("Inventory platform error: {0}")]
    ExternalService(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let (field, message) = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                (field.to_string(), message)
            })
            .unwrap_or_else(|| ("input".to_string(), "Invalid input".to_string()));
        AppError::Validation { field, message }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                },
            ),
            AppError::CrossProductReceipt(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "CROSS_PRODUCT_RECEIPT".to_string(),
                    message: err.to_string(),
                    field: Some("receipt_key".to_string()),
                },
            ),
            AppError::DuplicatePush(bag) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_PUSH".to_string(),
                    message: format!("Bag {} was already pushed to the inventory platform", bag),
                    field: None,
                },
            ),
            AppError::ConcurrencyConflict(msg) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "CONCURRENCY_CONFLICT".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INVALID_STATE_TRANSITION".to_string(),
                    message: msg.clone(),
                    field: None,
                },
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail {
                    code: "EXTERNAL_SERVICE_ERROR".to_string(),
                    message: format!("Inventory platform error: {}", msg),
                    field: None,
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                },
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
