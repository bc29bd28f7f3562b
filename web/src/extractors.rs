//! Custom Axum extractors.
//!
//! - `SessionHeader`: the anonymous session identifier from `X-Session-Id`
//!
//! # Example
//!
//! ```ignore
//! async fn handler(SessionHeader(session_id): SessionHeader) -> String {
//!     format!("Session: {session_id}")
//! }
//! ```

use crate::error::AppError;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use credit_meter_core::SessionId;
use credit_meter_core::constants::SESSION_HEADER;

/// Session identifier taken from the `X-Session-Id` header.
///
/// Rejects with `400 Bad Request` when the header is absent, empty, or not
/// valid visible ASCII.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHeader(pub SessionId);

#[async_trait]
impl<S> FromRequestParts<S> for SessionHeader
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Self(SessionId::from(s)))
            .ok_or_else(AppError::missing_session_header)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(req: Request<()>) -> Result<SessionHeader, AppError> {
        let (mut parts, ()) = req.into_parts();
        SessionHeader::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_session_header_present() {
        let req = Request::builder()
            .header(SESSION_HEADER, "0b6f6c1e-7e0e-4b8e-9d3c-2f1a5b7c9d11")
            .body(())
            .expect("Valid request");

        let SessionHeader(id) = extract(req).await.expect("Should extract");

        assert_eq!(id.as_str(), "0b6f6c1e-7e0e-4b8e-9d3c-2f1a5b7c9d11");
    }

    #[tokio::test]
    async fn test_header_name_is_case_insensitive() {
        let req = Request::builder()
            .header("x-session-id", "abc")
            .body(())
            .expect("Valid request");

        assert!(extract(req).await.is_ok());
    }

    #[tokio::test]
    async fn test_missing_header_is_bad_request() {
        let req = Request::builder().body(()).expect("Valid request");

        let err = extract(req).await.expect_err("Should reject");

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_header_is_bad_request() {
        let req = Request::builder()
            .header(SESSION_HEADER, "   ")
            .body(())
            .expect("Valid request");

        let err = extract(req).await.expect_err("Should reject");

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
