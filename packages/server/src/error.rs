use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::assets::AssetError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`,
    /// `UNSUPPORTED_TYPE`, `PAYLOAD_TOO_LARGE`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `PERMISSION_DENIED`, `NOT_FOUND`,
    /// `RANGE_NOT_SATISFIABLE`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "title must be 1-100 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    UnsupportedType(String),
    PayloadTooLarge {
        limit: u64,
    },
    TokenMissing,
    TokenInvalid,
    PermissionDenied,
    NotFound(String),
    /// Range outside a resource of `size` bytes.
    RangeNotSatisfiable {
        size: u64,
    },
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::UnsupportedType(mime) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "UNSUPPORTED_TYPE",
                    message: format!(
                        "Unsupported file type '{mime}'. Accepted: {}",
                        common::classify::ACCEPTED_TYPES_SUMMARY
                    ),
                },
            ),
            AppError::PayloadTooLarge { limit } => (
                StatusCode::PAYLOAD_TOO_LARGE,
                ErrorBody {
                    code: "PAYLOAD_TOO_LARGE",
                    message: format!("File exceeds the maximum size of {limit} bytes"),
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PERMISSION_DENIED",
                    message: "Insufficient permissions".into(),
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::RangeNotSatisfiable { size } => (
                StatusCode::RANGE_NOT_SATISFIABLE,
                ErrorBody {
                    code: "RANGE_NOT_SATISFIABLE",
                    message: format!("Requested range not satisfiable for {size} bytes"),
                },
            ),
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let unsatisfied_size = if let AppError::RangeNotSatisfiable { size } = &self {
            Some(*size)
        } else {
            None
        };

        let (status, body) = self.status_and_body();

        if let Some(size) = unsatisfied_size {
            (
                status,
                [(header::CONTENT_RANGE, format!("bytes */{size}"))],
                Json(body),
            )
                .into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<AssetError> for AppError {
    fn from(err: AssetError) -> Self {
        match err {
            AssetError::UnsupportedType(mime) => AppError::UnsupportedType(mime),
            AssetError::InvalidMetadata(msg) => AppError::Validation(msg),
            AssetError::TooLarge { limit } => AppError::PayloadTooLarge { limit },
            AssetError::NotFound => AppError::NotFound("Asset not found".into()),
            AssetError::RangeNotSatisfiable { size } => AppError::RangeNotSatisfiable { size },
            AssetError::Unauthorized => AppError::PermissionDenied,
            AssetError::StorageFailure(_) | AssetError::MetadataFailure(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}
