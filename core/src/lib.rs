//! # Credit Meter Core
//!
//! Shared vocabulary for the anonymous credit-metering subsystem.
//!
//! An unauthenticated visitor receives a fixed grant of credits bound to an
//! opaque session token. Each metered action (report generation) costs one
//! credit; the server-side ledger is the only authority on the balance.
//!
//! ## Crates
//!
//! ```text
//! ┌──────────────┐   X-Session-Id   ┌──────────────┐
//! │    client    │ ───────────────▶ │     web      │
//! │ SessionClient│ ◀─────────────── │  (axum API)  │
//! │ Augmentor    │   JSON / 402/404 └──────┬───────┘
//! └──────────────┘                         │
//!         ▲                                ▼
//!         │                        ┌──────────────┐
//!         └──────── core ────────▶ │    ledger    │
//!           (wire types, consts)   │ CreditLedger │
//!                                  └──────────────┘
//! ```
//!
//! This crate holds only what both sides must agree on: the JSON shapes,
//! header and route names, and the [`clock::Clock`] seam used for expiry.

pub mod clock;
pub mod constants;
pub mod session;

pub use chrono::{DateTime, Utc};
pub use clock::{Clock, ManualClock, SystemClock};
pub use session::{CreditInfo, CreditReceipt, ErrorBody, SessionId, SessionInfo};
