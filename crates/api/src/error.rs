//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{OrderError, ReviewError, storage::StorageError};

/// API-level error type that maps to HTTP responses.
///
/// Mapping: validation failures are 400, missing entities 404, state
/// machine violations and lost concurrent races 409, backend failures 500.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// The request lost against a concurrent state change.
    Conflict(String),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match &err {
            StorageError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StorageError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            StorageError::Backend(_) | StorageError::Serialization(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Empty
            | OrderError::ZeroQuantity { .. }
            | OrderError::TotalMismatch { .. }
            | OrderError::VendorMismatch { .. } => ApiError::BadRequest(err.to_string()),
            OrderError::UnknownProduct { .. } | OrderError::NotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            OrderError::InvalidTransition { .. } => ApiError::Conflict(err.to_string()),
            OrderError::Storage(inner) => inner.into(),
        }
    }
}

impl From<ReviewError> for ApiError {
    fn from(err: ReviewError) -> Self {
        match err {
            ReviewError::RatingOutOfRange { .. } | ReviewError::CommentTooShort { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            ReviewError::UnknownProduct(_) => ApiError::NotFound(err.to_string()),
            ReviewError::Storage(inner) => inner.into(),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart
            | CheckoutError::ZeroQuantity { .. }
            | CheckoutError::InsufficientStock { .. } => ApiError::BadRequest(err.to_string()),
            CheckoutError::UnknownProduct { .. } => ApiError::NotFound(err.to_string()),
            CheckoutError::Storage(inner) => inner.into(),
        }
    }
}
