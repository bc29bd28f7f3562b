//! Session client.
//!
//! Owns one anonymous session id and mediates every credit-affecting call.
//! The balance is never computed locally: whatever the store reports after
//! each call is the value callers should render.
//!
//! # Lifecycle
//!
//! ```text
//!            initialize_session()
//!   (none) ───────────────────────▶ (cached id) ──use_credit()──▶ receipt
//!      ▲                                │
//!      │   store says "unknown session" │
//!      └────────────────────────────────┘
//!            or clear_session()
//! ```
//!
//! The cached id is read from the [`KeyValueStore`] once at construction and
//! written back only by `create_session` and `clear_session`. Several
//! processes sharing one store follow last-writer-wins.

use crate::api::SessionApi;
use crate::error::{ApiError, Result, SessionError};
use crate::storage::KeyValueStore;
use credit_meter_core::constants::SESSION_STORAGE_KEY;
use credit_meter_core::{CreditInfo, CreditReceipt, SessionId, SessionInfo};
use std::sync::{PoisonError, RwLock};

/// Client-side owner of one anonymous session.
///
/// Construct once at startup and share it (usually behind an `Arc`) with
/// every consumer.
pub struct SessionClient<A, K> {
    api: A,
    store: K,
    storage_key: String,
    session_id: RwLock<Option<SessionId>>,
}

impl<A, K> SessionClient<A, K>
where
    A: SessionApi,
    K: KeyValueStore,
{
    /// Create a client persisting under the default storage key.
    pub fn new(api: A, store: K) -> Self {
        Self::with_storage_key(api, store, SESSION_STORAGE_KEY)
    }

    /// Create a client persisting under `storage_key`.
    ///
    /// Any id already stored under that key becomes the cached session. A
    /// store that cannot be read is logged and treated as empty.
    pub fn with_storage_key(api: A, store: K, storage_key: impl Into<String>) -> Self {
        let storage_key = storage_key.into();

        let session_id = match store.get(&storage_key) {
            Ok(value) => value
                .filter(|id| !id.trim().is_empty())
                .map(SessionId::from),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read persisted session id");
                None
            }
        };

        if let Some(id) = &session_id {
            tracing::debug!(session_id = %id, "Restored persisted session");
        }

        Self {
            api,
            store,
            storage_key,
            session_id: RwLock::new(session_id),
        }
    }

    /// Transport in use.
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// The cached session id, if any. Never touches the network.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether a session id is cached.
    pub fn has_active_session(&self) -> bool {
        self.session_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Ask the store for a new session and cache it, replacing any prior id.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionCreationFailed` if the store call fails;
    /// the previously cached id is left untouched in that case.
    pub async fn create_session(&self) -> Result<SessionInfo> {
        let info = self
            .api
            .create_session()
            .await
            .map_err(SessionError::SessionCreationFailed)?;

        self.replace(Some(info.session_id.clone()));
        self.persist(&info.session_id);

        tracing::info!(
            session_id = %info.session_id,
            credits_remaining = info.credits_remaining,
            "Anonymous session created"
        );

        Ok(info)
    }

    /// Current balance of the cached session.
    ///
    /// Returns `Ok(None)` when there is no session, including when the store
    /// reports the cached id unknown (the id is cleared in that case).
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CreditQueryFailed` for any other failure.
    pub async fn get_credits(&self) -> Result<Option<CreditInfo>> {
        let Some(session_id) = self.session_id() else {
            return Ok(None);
        };

        match self.api.credits(&session_id).await {
            Ok(info) => Ok(Some(info)),
            Err(ApiError::SessionNotFound) => {
                self.invalidate(&session_id);
                Ok(None)
            }
            Err(e) => Err(SessionError::CreditQueryFailed(e)),
        }
    }

    /// Spend one credit.
    ///
    /// The store decides; the returned receipt carries its new balance.
    ///
    /// # Errors
    ///
    /// - `NoActiveSession` if no id is cached
    /// - `CreditsExhausted` if the balance is zero; the metered action must not run
    /// - `SessionExpired` if the store no longer knows the id (now cleared)
    /// - `CreditUseFailed` for anything else; local state is unchanged
    pub async fn use_credit(&self) -> Result<CreditReceipt> {
        let session_id = self.session_id().ok_or(SessionError::NoActiveSession)?;

        match self.api.use_credit(&session_id).await {
            Ok(receipt) => Ok(receipt),
            Err(ApiError::CreditsExhausted { detail }) => {
                tracing::info!(session_id = %session_id, "Free credits exhausted");
                Err(SessionError::CreditsExhausted {
                    remaining: 0,
                    reason: detail,
                })
            }
            Err(ApiError::SessionNotFound) => {
                self.invalidate(&session_id);
                Err(SessionError::SessionExpired)
            }
            Err(e) => Err(SessionError::CreditUseFailed(e)),
        }
    }

    /// Forget the session locally and in durable storage. Idempotent.
    pub fn clear_session(&self) {
        self.replace(None);
        if let Err(e) = self.store.delete(&self.storage_key) {
            tracing::warn!(error = %e, "Could not delete persisted session id");
        }
    }

    /// Make sure a confirmed session exists.
    ///
    /// A cached id is confirmed with a balance query and reused when the
    /// store still reports it valid. Otherwise a new session is created.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionCreationFailed` if a new session was
    /// needed and could not be created.
    pub async fn initialize_session(&self) -> Result<SessionInfo> {
        if let Some(session_id) = self.session_id() {
            match self.get_credits().await {
                Ok(Some(info)) if info.session_valid => {
                    return Ok(SessionInfo {
                        session_id,
                        credits_remaining: info.credits_remaining,
                    });
                }
                Ok(_) => {
                    tracing::info!(session_id = %session_id, "Cached session is gone, creating a new one");
                }
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        error = %e,
                        "Could not confirm cached session, creating a new one"
                    );
                }
            }
        }

        self.create_session().await
    }

    /// Clear the cached id only if it is still `session_id`, so a loss report
    /// for an old session never wipes a newer one.
    pub(crate) fn invalidate(&self, session_id: &SessionId) {
        let cleared = {
            let mut current = self
                .session_id
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if current.as_ref() == Some(session_id) {
                *current = None;
                true
            } else {
                false
            }
        };

        if cleared {
            tracing::warn!(session_id = %session_id, "Session expired on the server, cleared locally");
            if let Err(e) = self.store.delete(&self.storage_key) {
                tracing::warn!(error = %e, "Could not delete persisted session id");
            }
        }
    }

    fn replace(&self, session_id: Option<SessionId>) {
        *self
            .session_id
            .write()
            .unwrap_or_else(PoisonError::into_inner) = session_id;
    }

    fn persist(&self, session_id: &SessionId) {
        if let Err(e) = self.store.set(&self.storage_key, session_id.as_str()) {
            tracing::warn!(session_id = %session_id, error = %e, "Could not persist session id");
        }
    }
}

impl<A, K> std::fmt::Debug for SessionClient<A, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("storage_key", &self.storage_key)
            .field(
                "session_id",
                &*self.session_id.read().unwrap_or_else(PoisonError::into_inner),
            )
            .finish_non_exhaustive()
    }
}
