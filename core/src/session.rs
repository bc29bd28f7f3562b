//! Session wire types.
//!
//! Field names match the JSON the session store speaks, so these types are
//! used unchanged on both sides of the wire.

use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Opaque, server-issued identifier of an anonymous session.
///
/// Clients never interpret the contents; they only store it and echo it back
/// in the `X-Session-Id` header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Issue a fresh random identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the raw token.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw token.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Payloads
// ═══════════════════════════════════════════════════════════════════════

/// A session together with its confirmed balance.
///
/// Returned by session creation and by client bootstrap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session identifier.
    pub session_id: SessionId,

    /// Credits left, as confirmed by the store.
    pub credits_remaining: u32,
}

/// Read view of a session's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInfo {
    /// Credits left, as confirmed by the store.
    pub credits_remaining: u32,

    /// Whether the store still recognises the session.
    pub session_valid: bool,
}

impl CreditInfo {
    /// `true` when the session is valid and has at least one credit.
    #[must_use]
    pub const fn can_spend(&self) -> bool {
        self.session_valid && self.credits_remaining > 0
    }
}

/// Outcome of a granted credit decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditReceipt {
    /// Always `true` on the wire; failures use error statuses instead.
    pub success: bool,

    /// Balance after the decrement.
    pub credits_remaining: u32,

    /// Human-readable summary, e.g. `"3 credits remaining"`.
    pub message: String,
}

impl CreditReceipt {
    /// Build the receipt for a granted decrement.
    #[must_use]
    pub fn granted(credits_remaining: u32) -> Self {
        Self {
            success: true,
            credits_remaining,
            message: format!("{credits_remaining} credits remaining"),
        }
    }
}

/// Error body carried by every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    pub detail: String,
}
