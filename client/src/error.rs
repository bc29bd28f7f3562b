//! Error types for the session client.
//!
//! Three layers, innermost first:
//!
//! - [`ApiError`]: one HTTP exchange with the session store
//! - [`SessionError`]: the outcome of a session-client operation
//! - [`StorageError`]: the local key-value persistence

use credit_meter_core::ErrorBody;
use thiserror::Error;

/// Errors from a single call to the session store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The store does not know the session (404 mentioning "Session").
    #[error("Session not found or expired")]
    SessionNotFound,

    /// The session has no credits left (402).
    #[error("Credits exhausted: {detail}")]
    CreditsExhausted {
        /// Server-provided reason
        detail: String,
    },

    /// Any other non-success status.
    #[error("API error (status {status}): {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Error detail or raw body
        message: String,
    },

    /// HTTP request failed before a response arrived.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response body did not have the expected shape.
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),
}

impl ApiError {
    /// Map a non-success status and its body onto an error.
    ///
    /// A 404 only counts as session loss when the body mentions "Session";
    /// a 404 for some unrelated resource stays a plain [`ApiError::Status`].
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            402 => Self::CreditsExhausted {
                detail: error_detail(body),
            },
            404 if mentions_session(body) => Self::SessionNotFound,
            _ => Self::Status {
                status,
                message: error_detail(body),
            },
        }
    }
}

/// Errors surfaced by [`SessionClient`](crate::SessionClient) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The store could not create a session.
    #[error("Session creation failed: {0}")]
    SessionCreationFailed(ApiError),

    /// `use_credit` was called before any session existed.
    #[error("No active session, call initialize_session first")]
    NoActiveSession,

    /// The store refused the decrement; the metered action must not run.
    #[error("No credits remaining: {reason}")]
    CreditsExhausted {
        /// Balance reported by the store (always 0)
        remaining: u32,
        /// Human-readable reason from the store
        reason: String,
    },

    /// The store no longer knows the session; local state was cleared.
    #[error("Session expired, start a new one with initialize_session")]
    SessionExpired,

    /// Balance query failed for a reason other than session loss.
    #[error("Credit query failed: {0}")]
    CreditQueryFailed(ApiError),

    /// Decrement failed for a reason other than exhaustion or session loss.
    #[error("Credit use failed: {0}")]
    CreditUseFailed(ApiError),
}

impl SessionError {
    /// Whether the caller should send the visitor to registration.
    #[must_use]
    pub const fn requires_registration(&self) -> bool {
        matches!(self, Self::CreditsExhausted { .. })
    }

    /// Whether the caller should restart with `initialize_session`.
    #[must_use]
    pub const fn requires_new_session(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::NoActiveSession)
    }
}

/// Errors from the local key-value store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON object of strings.
    #[error("Storage data is corrupt: {0}")]
    Corrupt(String),

    /// Another thread panicked while holding the store lock.
    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// Result type for session-client operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// `detail` from a `{"detail": ...}` body, or the raw body otherwise.
pub(crate) fn error_detail(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(|_| body.trim().to_string(), |b| b.detail)
}

pub(crate) fn mentions_session(body: &str) -> bool {
    body.contains("Session")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_402_is_exhausted_with_detail() {
        let err = ApiError::from_status(402, r#"{"detail":"No credits remaining."}"#);
        assert_eq!(
            err,
            ApiError::CreditsExhausted {
                detail: "No credits remaining.".to_string()
            }
        );
    }

    #[test]
    fn test_404_needs_session_in_body() {
        assert_eq!(
            ApiError::from_status(404, r#"{"detail":"Session not found or expired"}"#),
            ApiError::SessionNotFound
        );
        assert_eq!(
            ApiError::from_status(404, r#"{"detail":"Report not found"}"#),
            ApiError::Status {
                status: 404,
                message: "Report not found".to_string()
            }
        );
    }

    #[test]
    fn test_non_json_body_is_kept_raw() {
        assert_eq!(
            ApiError::from_status(502, " Bad Gateway \n"),
            ApiError::Status {
                status: 502,
                message: "Bad Gateway".to_string()
            }
        );
    }

    #[test]
    fn test_error_guidance() {
        let exhausted = SessionError::CreditsExhausted {
            remaining: 0,
            reason: "none left".to_string(),
        };
        assert!(exhausted.requires_registration());
        assert!(!exhausted.requires_new_session());
        assert!(SessionError::SessionExpired.requires_new_session());
        assert!(SessionError::NoActiveSession.requires_new_session());
    }
}
