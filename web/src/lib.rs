//! HTTP surface of the anonymous credit session store.
//!
//! The handlers are a thin imperative shell over a
//! [`CreditLedger`](credit_meter_ledger::CreditLedger): they parse the
//! `X-Session-Id` header, ask the ledger, and map its answer onto the status
//! codes clients rely on.
//!
//! | Outcome | Status |
//! |---|---|
//! | Session created / balance / credit granted | 200 |
//! | Header missing | 400 |
//! | Balance already zero | 402 |
//! | Session unknown or expired | 404 (detail mentions "Session") |
//! | Backend failure | 500 |
//!
//! # Example
//!
//! ```ignore
//! use credit_meter_ledger::InMemoryLedger;
//! use credit_meter_web::{AppState, build_router};
//!
//! let app = build_router(AppState::new(InMemoryLedger::default()), &[]);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8000").await?;
//! axum::serve(listener, app).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod state;

// Re-export key types for convenience
pub use config::{ConfigError, ServerConfig};
pub use error::AppError;
pub use extractors::SessionHeader;
pub use router::{build_router, session_router};
pub use state::AppState;

/// Result type alias for web handlers.
pub type WebResult<T> = Result<T, AppError>;
