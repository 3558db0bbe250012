//! API error types and conversions

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use intake_core::IntakeError;

use crate::handlers::order::OrderResponse;

/// Message returned for any failure the caller cannot fix
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Terjadi kesalahan pada server saat memproses order Anda.";

/// API error type that converts to `{success: false, message}` responses
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request, message shown to the caller
    BadRequest(String),
    /// 500 Internal Server Error, message is logged but not returned
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => {
                tracing::debug!(%msg, "API client error");
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "Error while processing order");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    INTERNAL_ERROR_MESSAGE.to_string(),
                )
            }
        };

        (status, Json(OrderResponse::failure(message))).into_response()
    }
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::IncompleteData { ref missing } => {
                tracing::debug!(?missing, "Order is missing required fields");
                ApiError::BadRequest(err.to_string())
            }
            IntakeError::MissingProof
            | IntakeError::DuplicateProof
            | IntakeError::FileTooLarge { .. } => ApiError::BadRequest(err.to_string()),
            IntakeError::Multipart(_) | IntakeError::Storage(_) | IntakeError::Recorder(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

/// Plain-text failures of the static asset endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetError {
    /// `string` or `nominal` query parameter absent
    MissingParameters,
    /// Placeholder image not provisioned on disk
    PlaceholderMissing,
}

impl IntoResponse for AssetError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AssetError::MissingParameters => (
                StatusCode::BAD_REQUEST,
                "Missing string or nominal parameter",
            ),
            AssetError::PlaceholderMissing => (
                StatusCode::NOT_FOUND,
                "QRIS placeholder image not found. Please create one or use a real QRIS API.",
            ),
        };

        (status, message).into_response()
    }
}
