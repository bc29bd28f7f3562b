//! Client side of the anonymous credit session store.
//!
//! # Overview
//!
//! ```text
//! view ──▶ MeteredGate ──▶ SessionClient ──▶ SessionApi ──▶ session store
//!                              ▲   │
//!           RequestAugmentor ──┘   └──▶ KeyValueStore (persisted id)
//! ```
//!
//! - [`SessionClient`] owns the session id, creates sessions and spends
//!   credits. The store is authoritative for every balance.
//! - [`RequestAugmentor`] attaches `X-Session-Id` to downstream calls and
//!   clears the session when one of them reports it unknown.
//! - [`MeteredGate`] and [`QuotaBanner`] are the glue views call into.
//!
//! # Example
//!
//! ```ignore
//! use credit_meter_client::{ClientConfig, FileStore, HttpSessionApi, MeteredGate, SessionClient};
//! use std::sync::Arc;
//!
//! let config = ClientConfig::from_env();
//! let session = Arc::new(SessionClient::new(
//!     HttpSessionApi::new(config.clone()),
//!     FileStore::new("session.json"),
//! ));
//!
//! match MeteredGate::new(Arc::clone(&session)).admit().await? {
//!     Admission::Granted { credits_remaining } => run_report(credits_remaining).await,
//!     Admission::RegistrationRequired { reason } => redirect_to_signup(&reason),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod augmentor;
pub mod config;
pub mod error;
pub mod metered;
pub mod session;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export key types for convenience
pub use api::{HttpSessionApi, SessionApi};
pub use augmentor::{ApiResponse, RequestAugmentor, ResponseSignal, classify_response};
pub use config::ClientConfig;
pub use error::{ApiError, Result, SessionError, StorageError};
pub use metered::{Admission, MeteredGate, QuotaBanner};
pub use session::SessionClient;
pub use storage::{FileStore, KeyValueStore, MemoryStore};

pub use credit_meter_core::{CreditInfo, CreditReceipt, SessionId, SessionInfo};
