//! # Credit Meter Ledger
//!
//! The server-side Session Store: the single authority on how many credits an
//! anonymous session has left.
//!
//! ## Guarantees
//!
//! - **Atomic decrement**: [`CreditLedger::use_credit`] performs check-and-decrement
//!   as one step per session, so concurrent requests against the same identifier
//!   never double-spend and never drive a balance below zero.
//! - **Idle expiry**: sessions unused for longer than the configured TTL vanish
//!   and are reported exactly like unknown identifiers.
//!
//! ## Backends
//!
//! - [`InMemoryLedger`]: process-local, for tests and single-node deployments
//! - [`RedisLedger`]: durable, shared across server replicas
//! - [`LedgerBackend`]: runtime choice between the two

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod backend;
pub mod config;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod redis_ledger;

pub use backend::LedgerBackend;
pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use ledger::{CreditLedger, DebitOutcome};
pub use memory::InMemoryLedger;
pub use redis_ledger::RedisLedger;
