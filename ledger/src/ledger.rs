//! Credit ledger trait.

use crate::error::Result;
use credit_meter_core::{SessionId, SessionInfo};

/// Result of an atomic decrement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// One credit was consumed.
    Granted {
        /// Balance after the decrement.
        credits_remaining: u32,
    },

    /// The balance was already zero; nothing changed.
    Exhausted,
}

impl DebitOutcome {
    /// `true` if a credit was consumed.
    #[must_use]
    pub const fn is_granted(&self) -> bool {
        matches!(self, Self::Granted { .. })
    }
}

/// Authoritative session-to-balance store.
///
/// # Implementation Notes
///
/// - `use_credit` MUST check and decrement as a single atomic step per
///   identifier. Clients rely on this; they never decrement locally.
/// - Sessions idle longer than the configured TTL are treated as unknown.
/// - A successful `use_credit` refreshes the idle timer; a balance query does not.
pub trait CreditLedger: Send + Sync {
    /// Create a session holding the configured credit grant.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn create_session(&self) -> impl std::future::Future<Output = Result<SessionInfo>> + Send;

    /// Current balance of a session.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Session unknown or expired → `LedgerError::SessionNotFound`
    /// - Backend fails
    fn balance(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<u32>> + Send;

    /// Atomically consume one credit.
    ///
    /// # Returns
    ///
    /// `Granted` with the new balance, or `Exhausted` if the balance was zero.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Session unknown or expired → `LedgerError::SessionNotFound`
    /// - Backend fails
    fn use_credit(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<DebitOutcome>> + Send;

    /// Forget a session. Deleting an unknown session is not an error.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn delete_session(
        &self,
        session_id: &SessionId,
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Drop every session idle longer than the TTL.
    ///
    /// # Returns
    ///
    /// Number of sessions removed. Backends with native expiry return 0.
    ///
    /// # Errors
    ///
    /// Returns error if the backend fails.
    fn purge_expired(&self) -> impl std::future::Future<Output = Result<usize>> + Send;
}
