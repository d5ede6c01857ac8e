//! # API Error Types
//!
//! The last hop of the error chain: everything the repositories can produce
//! is translated here into an HTTP status plus a JSON body.
//!
//! ## Status Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ApiError                  Status   Code                                │
//! │  ───────────────────────   ──────   ────────────────────               │
//! │  Validation (field list)   400      VALIDATION_ERROR                   │
//! │  InsufficientStock         400      INSUFFICIENT_STOCK                 │
//! │  BadRequest                400      BAD_REQUEST                        │
//! │  NotFound                  404      NOT_FOUND                          │
//! │  Conflict                  409      CONFLICT                           │
//! │  Storage                   500      STORAGE_ERROR                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Bodies are `{ code, message }`, with an `errors: [{field, message}]`
//! array appended for validation failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use stockbook_core::validation::FieldViolation;
use stockbook_db::DbError;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more request fields failed structural validation.
    #[error("Validation failed")]
    Validation(Vec<FieldViolation>),

    /// Stock-out (or stock-in reversal) exceeding available quantity.
    #[error("{0}")]
    InsufficientStock(String),

    /// Malformed request body (bad JSON, unknown `type` tag).
    #[error("{0}")]
    BadRequest(String),

    /// Referenced entity doesn't exist.
    #[error("{0}")]
    NotFound(String),

    /// Uniqueness or referential-integrity violation.
    #[error("{0}")]
    Conflict(String),

    /// Persistence failure. Details are logged, not leaked.
    #[error("Internal storage error")]
    Storage(#[source] DbError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InsufficientStock(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::InsufficientStock(_) => "INSUFFICIENT_STOCK",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Storage(_) => "STORAGE_ERROR",
        }
    }
}

/// Wire shape for error responses.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [FieldViolation]>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Storage(ref source) = self {
            error!(error = %source, "Storage failure");
        }

        let errors = match &self {
            ApiError::Validation(violations) => Some(violations.as_slice()),
            _ => None,
        };

        let body = ErrorBody {
            code: self.code(),
            message: self.to_string(),
            errors,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Repository errors keep their category across the boundary; only the
/// plumbing variants collapse into `Storage`.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::HasTransactions { .. } => {
                ApiError::Conflict(err.to_string())
            }
            DbError::InsufficientStock { .. } => ApiError::InsufficientStock(err.to_string()),
            other => ApiError::Storage(other),
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Product", "p1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("sku", "SKU-1").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::InsufficientStock {
            sku: "SKU-1".to_string(),
            available: 1,
            requested: 5,
        }
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("available 1, requested 5"));

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
