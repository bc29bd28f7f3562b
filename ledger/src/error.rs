//! Error types for ledger operations.

use thiserror::Error;

/// Result type alias for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures a ledger can report.
///
/// Quota exhaustion is not an error here; it is the
/// [`DebitOutcome::Exhausted`](crate::DebitOutcome::Exhausted) outcome.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// The identifier is unknown, or the session has expired.
    #[error("Session not found or expired")]
    SessionNotFound,

    /// The storage backend failed.
    #[error("Ledger backend error: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("Corrupt session record: {0}")]
    CorruptRecord(String),

    /// Internal invariant broken (e.g. poisoned lock).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LedgerError {
    /// Returns `true` if the caller's identifier is no longer usable.
    ///
    /// # Examples
    ///
    /// ```
    /// # use credit_meter_ledger::LedgerError;
    /// assert!(LedgerError::SessionNotFound.is_session_gone());
    /// assert!(!LedgerError::Backend("down".into()).is_session_gone());
    /// ```
    #[must_use]
    pub const fn is_session_gone(&self) -> bool {
        matches!(self, Self::SessionNotFound)
    }
}
