use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::blog::ValidationReport;

/// Failures surfaced by the HTTP handlers
#[derive(Debug, Error)]
pub enum AppError {
    /// The database is missing or did not answer the connectivity check
    #[error("{0}")]
    Connectivity(String),

    /// A query failed (or no database client exists); the message is what
    /// the caller sees, details are logged where the error is raised
    #[error("{0}")]
    Query(String),

    #[error("validation failed")]
    Validation(ValidationReport),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),

    /// A dependent service is not configured
    #[error("{0}")]
    Unavailable(String),

    /// A dependent service rejected or failed the call
    #[error("{0}")]
    Upstream(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
struct ValidationErrorResponse<'a> {
    error: &'static str,
    #[serde(flatten)]
    report: &'a ValidationReport,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Connectivity(_) | AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Query(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            AppError::Validation(report) => (
                status,
                Json(ValidationErrorResponse {
                    error: "Validation failed",
                    report: &report,
                }),
            )
                .into_response(),
            other => (
                status,
                Json(ErrorResponse {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::Connectivity("down".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::Query("Failed to fetch analytics".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Validation(ValidationReport::default()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Conflict("dup".into()).status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_message_is_displayed_verbatim() {
        assert_eq!(
            AppError::Query("Database connection failed".into()).to_string(),
            "Database connection failed"
        );
    }
}
