//! Error types for the compliance API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared_types::ComplianceError;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Compliance(#[from] ComplianceError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::Compliance(err) => match err {
                ComplianceError::UnsupportedRuleType(_) => {
                    (StatusCode::BAD_REQUEST, "UNSUPPORTED_RULE_TYPE")
                }
                ComplianceError::MalformedPayload { .. } => {
                    (StatusCode::BAD_REQUEST, "MALFORMED_PAYLOAD")
                }
                ComplianceError::PermissionDenied { .. } => {
                    (StatusCode::FORBIDDEN, "PERMISSION_DENIED")
                }
                ComplianceError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ComplianceError::DuplicateRecord(_) => (StatusCode::CONFLICT, "DUPLICATE_RECORD"),
                ComplianceError::MissingReference { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "MISSING_REFERENCE")
                }
                ComplianceError::ChainIntegrityViolation { index, reason } => {
                    tracing::error!("Audit chain broken at {}: {}", index, reason);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "CHAIN_INTEGRITY_VIOLATION",
                    )
                }
            },
            ServerError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ServerError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
