//! Consumer glue: gating a metered action and rendering quota state.

use crate::api::SessionApi;
use crate::error::{Result, SessionError};
use crate::session::SessionClient;
use crate::storage::KeyValueStore;
use credit_meter_core::CreditInfo;
use credit_meter_core::constants::LOW_CREDIT_THRESHOLD;
use std::fmt;
use std::sync::Arc;

/// Whether a metered action may run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// One credit was spent; run the action.
    Granted {
        /// Balance after the spend, as reported by the store
        credits_remaining: u32,
    },
    /// Out of credits; send the visitor to registration instead.
    RegistrationRequired {
        /// Reason reported by the store
        reason: String,
    },
}

/// Single entry point for views that trigger a metered action.
///
/// Callers should disable the triggering control while `admit` is pending;
/// correctness does not depend on it, but a double click still spends twice.
pub struct MeteredGate<A, K> {
    session: Arc<SessionClient<A, K>>,
}

impl<A, K> MeteredGate<A, K>
where
    A: SessionApi,
    K: KeyValueStore,
{
    /// Gate backed by `session`.
    #[must_use]
    pub const fn new(session: Arc<SessionClient<A, K>>) -> Self {
        Self { session }
    }

    /// Ensure a session exists, then spend one credit.
    ///
    /// # Errors
    ///
    /// Surfaces every `SessionError` except `CreditsExhausted`, which becomes
    /// [`Admission::RegistrationRequired`]. No retries are attempted.
    pub async fn admit(&self) -> Result<Admission> {
        self.session.initialize_session().await?;

        match self.session.use_credit().await {
            Ok(receipt) => Ok(Admission::Granted {
                credits_remaining: receipt.credits_remaining,
            }),
            Err(SessionError::CreditsExhausted { reason, .. }) => {
                Ok(Admission::RegistrationRequired { reason })
            }
            Err(e) => Err(e),
        }
    }
}

/// Quota state to show next to a metered control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaBanner {
    /// Plenty left.
    Available {
        /// Credits left
        remaining: u32,
        /// Credits granted per session
        grant: u32,
    },
    /// At or below the low-credit threshold; nudge towards sign-up.
    RunningLow {
        /// Credits left
        remaining: u32,
        /// Credits granted per session
        grant: u32,
    },
    /// Nothing left.
    Exhausted,
}

impl QuotaBanner {
    /// Banner for a balance reported by the store.
    #[must_use]
    pub const fn from_credits(info: &CreditInfo, grant: u32) -> Self {
        match info.credits_remaining {
            0 => Self::Exhausted,
            remaining if remaining <= LOW_CREDIT_THRESHOLD => Self::RunningLow { remaining, grant },
            remaining => Self::Available { remaining, grant },
        }
    }

    /// Whether to offer the sign-up link.
    #[must_use]
    pub const fn suggests_sign_up(&self) -> bool {
        !matches!(self, Self::Available { .. })
    }
}

impl fmt::Display for QuotaBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available { remaining, grant } => write!(f, "Free reports: {remaining}/{grant}"),
            Self::RunningLow { remaining, grant } => {
                write!(f, "Free reports: {remaining}/{grant}. Sign up for unlimited")
            }
            Self::Exhausted => {
                f.write_str("Free reports exhausted! Sign up now to get unlimited access.")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::mocks::MockSessionApi;
    use crate::storage::MemoryStore;

    fn info(credits_remaining: u32) -> CreditInfo {
        CreditInfo {
            credits_remaining,
            session_valid: true,
        }
    }

    #[test]
    fn test_banner_thresholds() {
        assert_eq!(
            QuotaBanner::from_credits(&info(6), 6),
            QuotaBanner::Available { remaining: 6, grant: 6 }
        );
        assert_eq!(
            QuotaBanner::from_credits(&info(3), 6),
            QuotaBanner::Available { remaining: 3, grant: 6 }
        );
        assert_eq!(
            QuotaBanner::from_credits(&info(2), 6),
            QuotaBanner::RunningLow { remaining: 2, grant: 6 }
        );
        assert_eq!(QuotaBanner::from_credits(&info(0), 6), QuotaBanner::Exhausted);
    }

    #[test]
    fn test_banner_text() {
        let banner = QuotaBanner::from_credits(&info(4), 6);
        assert_eq!(banner.to_string(), "Free reports: 4/6");
        assert!(!banner.suggests_sign_up());
        assert!(QuotaBanner::from_credits(&info(1), 6).suggests_sign_up());
    }

    #[tokio::test]
    async fn test_admit_until_registration_required() {
        let session = Arc::new(SessionClient::new(MockSessionApi::new(2), MemoryStore::new()));
        let gate = MeteredGate::new(Arc::clone(&session));

        assert_eq!(
            gate.admit().await.unwrap(),
            Admission::Granted { credits_remaining: 1 }
        );
        assert_eq!(
            gate.admit().await.unwrap(),
            Admission::Granted { credits_remaining: 0 }
        );
        assert!(matches!(
            gate.admit().await.unwrap(),
            Admission::RegistrationRequired { .. }
        ));
        assert_eq!(session.api().sessions_created(), 1);
    }

    #[tokio::test]
    async fn test_admit_surfaces_creation_failure() {
        let api = MockSessionApi::new(6);
        api.fail_next(ApiError::RequestFailed("down".to_string()));
        let gate = MeteredGate::new(Arc::new(SessionClient::new(api, MemoryStore::new())));

        assert!(matches!(
            gate.admit().await.unwrap_err(),
            SessionError::SessionCreationFailed(_)
        ));
    }
}
