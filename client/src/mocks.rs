//! In-process session store for tests.

use crate::api::SessionApi;
use crate::error::ApiError;
use credit_meter_core::constants::details;
use credit_meter_core::{CreditInfo, CreditReceipt, SessionId, SessionInfo};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MockState {
    sessions: HashMap<SessionId, u32>,
    fail_next: Option<ApiError>,
    sessions_created: usize,
    calls: usize,
}

/// Mock session store.
///
/// Balances live in a shared map; each decrement is checked and applied under
/// one lock, like the real store. Clones share state, so a test can keep a
/// handle to expire sessions or inject failures.
#[derive(Debug, Clone)]
pub struct MockSessionApi {
    grant: u32,
    state: Arc<Mutex<MockState>>,
}

impl MockSessionApi {
    /// New store granting `grant` credits per session.
    #[must_use]
    pub fn new(grant: u32) -> Self {
        Self {
            grant,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Make the next call (of any kind) fail with `error`.
    pub fn fail_next(&self, error: ApiError) {
        self.lock().fail_next = Some(error);
    }

    /// Forget `session_id`, as if it idled out on the server.
    pub fn expire(&self, session_id: &SessionId) {
        self.lock().sessions.remove(session_id);
    }

    /// Server-side balance of `session_id`.
    #[must_use]
    pub fn balance(&self, session_id: &SessionId) -> Option<u32> {
        self.lock().sessions.get(session_id).copied()
    }

    /// Number of sessions created so far.
    #[must_use]
    pub fn sessions_created(&self) -> usize {
        self.lock().sessions_created
    }

    /// Number of calls received so far, failed ones included.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) -> Result<MutexGuard<'_, MockState>, ApiError> {
        let mut state = self.lock();
        state.calls += 1;
        match state.fail_next.take() {
            Some(error) => Err(error),
            None => Ok(state),
        }
    }
}

impl Default for MockSessionApi {
    fn default() -> Self {
        Self::new(credit_meter_core::constants::DEFAULT_CREDIT_GRANT)
    }
}

impl SessionApi for MockSessionApi {
    fn create_session(&self) -> impl Future<Output = Result<SessionInfo, ApiError>> + Send {
        let result = self.begin().map(|mut state| {
            let session_id = SessionId::generate();
            state.sessions.insert(session_id.clone(), self.grant);
            state.sessions_created += 1;
            SessionInfo {
                session_id,
                credits_remaining: self.grant,
            }
        });

        async move { result }
    }

    fn credits(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<CreditInfo, ApiError>> + Send {
        let result = self.begin().and_then(|state| {
            state
                .sessions
                .get(session_id)
                .map(|&credits_remaining| CreditInfo {
                    credits_remaining,
                    session_valid: true,
                })
                .ok_or(ApiError::SessionNotFound)
        });

        async move { result }
    }

    fn use_credit(
        &self,
        session_id: &SessionId,
    ) -> impl Future<Output = Result<CreditReceipt, ApiError>> + Send {
        let result = self.begin().and_then(|mut state| {
            let balance = state
                .sessions
                .get_mut(session_id)
                .ok_or(ApiError::SessionNotFound)?;

            if *balance == 0 {
                return Err(ApiError::CreditsExhausted {
                    detail: details::CREDITS_EXHAUSTED.to_string(),
                });
            }

            *balance -= 1;
            Ok(CreditReceipt::granted(*balance))
        });

        async move { result }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_decrements_until_exhausted() {
        let api = MockSessionApi::new(2);
        let id = api.create_session().await.unwrap().session_id;

        assert_eq!(api.use_credit(&id).await.unwrap().credits_remaining, 1);
        assert_eq!(api.use_credit(&id).await.unwrap().credits_remaining, 0);
        assert!(matches!(
            api.use_credit(&id).await.unwrap_err(),
            ApiError::CreditsExhausted { .. }
        ));
        assert_eq!(api.balance(&id), Some(0));
    }

    #[tokio::test]
    async fn test_fail_next_applies_once() {
        let api = MockSessionApi::default();
        api.fail_next(ApiError::RequestFailed("down".to_string()));

        assert!(api.create_session().await.is_err());
        assert!(api.create_session().await.is_ok());
        assert_eq!(api.calls(), 2);
        assert_eq!(api.sessions_created(), 1);
    }
}
