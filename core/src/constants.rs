//! Protocol constants.
//!
//! Values that the server, the client and any consumer must agree on.

/// Request header carrying the anonymous session identifier.
pub const SESSION_HEADER: &str = "X-Session-Id";

/// Durable storage key under which the client persists its session identifier.
pub const SESSION_STORAGE_KEY: &str = "anonymous_session_id";

/// Credits granted to every freshly created session.
pub const DEFAULT_CREDIT_GRANT: u32 = 6;

/// Sessions idle for longer than this are expired by the ledger.
pub const DEFAULT_IDLE_TTL_SECS: i64 = 24 * 60 * 60;

/// Remaining-credit threshold at which consumers warn the visitor.
pub const LOW_CREDIT_THRESHOLD: u32 = 2;

/// Route paths served by the session store.
pub mod routes {
    /// `POST` - create a new anonymous session.
    pub const CREATE_SESSION: &str = "/session/create";

    /// `GET` - query the balance of the session named in the header.
    pub const CREDITS: &str = "/session/credits";

    /// `POST` - atomically consume one credit.
    pub const USE_CREDIT: &str = "/session/use-credit";
}

/// Canonical `detail` strings returned in error bodies.
pub mod details {
    /// Identifier unknown to the store, or expired.
    ///
    /// Clients recognise session loss by the word "Session" in a 404 body.
    pub const SESSION_NOT_FOUND: &str = "Session not found or expired";

    /// Balance is zero.
    pub const CREDITS_EXHAUSTED: &str = "No credits remaining. Please sign up to continue.";

    /// The session header was missing or empty.
    pub const SESSION_HEADER_REQUIRED: &str = "Session ID required in X-Session-Id header";
}
