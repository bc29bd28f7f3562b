//! Error types for web handlers.
//!
//! This module bridges ledger errors and HTTP responses. Every error body has
//! the shape `{"detail": "...", "code": "..."}`; clients key off the status
//! code and, for 404s, the word "Session" in `detail`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use credit_meter_core::constants::details;
use credit_meter_ledger::LedgerError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    detail: String,
    /// Error code (for client error handling)
    code: &'static str,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, detail: String, code: &'static str) -> Self {
        Self {
            status,
            detail,
            code,
            source: None,
        }
    }

    /// Attach the underlying cause (logged, never sent to the client).
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail.into(), "BAD_REQUEST")
    }

    /// 400 for a missing or empty session header.
    #[must_use]
    pub fn missing_session_header() -> Self {
        Self::bad_request(details::SESSION_HEADER_REQUIRED)
    }

    /// 402 when the session has no credits left.
    #[must_use]
    pub fn credits_exhausted() -> Self {
        Self::new(
            StatusCode::PAYMENT_REQUIRED,
            details::CREDITS_EXHAUSTED.to_string(),
            "CREDITS_EXHAUSTED",
        )
    }

    /// 404 when the session is unknown or expired.
    #[must_use]
    pub fn session_not_found() -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            details::SESSION_NOT_FOUND.to_string(),
            "SESSION_NOT_FOUND",
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            detail.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// HTTP status this error maps to.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.detail)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Human-readable reason.
    detail: String,
    /// Error code (for client error handling).
    code: &'static str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    detail = %self.detail,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    detail = %self.detail,
                    "Internal server error"
                ),
            }
        }

        let body = ErrorResponse {
            detail: self.detail,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::SessionNotFound => Self::session_not_found(),
            other => Self::internal("An internal error occurred").with_source(other.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_session_not_found_mentions_session() {
        let err = AppError::session_not_found();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.detail.contains("Session"));
    }

    #[test]
    fn test_credits_exhausted_is_payment_required() {
        let err = AppError::credits_exhausted();
        assert_eq!(err.status, StatusCode::PAYMENT_REQUIRED);
        assert_eq!(err.code, "CREDITS_EXHAUSTED");
    }

    #[test]
    fn test_ledger_errors_map_to_statuses() {
        assert_eq!(
            AppError::from(LedgerError::SessionNotFound).status(),
            StatusCode::NOT_FOUND
        );

        let backend = AppError::from(LedgerError::Backend("connection reset".into()));
        assert_eq!(backend.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(std::error::Error::source(&backend).is_some());
        assert!(!backend.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_body_shape() {
        let response = AppError::session_not_found().into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["detail"], "Session not found or expired");
        assert_eq!(body["code"], "SESSION_NOT_FOUND");
    }
}
