//! In-memory credit ledger.
//!
//! Every operation runs under a single mutex acquisition, which is what makes
//! `use_credit` an atomic check-and-decrement. Expired sessions are swept
//! lazily at the start of each call.

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::{CreditLedger, DebitOutcome};
use chrono::{DateTime, Utc};
use credit_meter_core::{Clock, SessionId, SessionInfo, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Stored state of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SessionRecord {
    credits_remaining: u32,
    created_at: DateTime<Utc>,
    last_used: DateTime<Utc>,
}

/// Process-local ledger.
///
/// Clones share the same sessions.
#[derive(Debug, Clone)]
pub struct InMemoryLedger<C = SystemClock> {
    sessions: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    config: LedgerConfig,
    clock: C,
}

impl InMemoryLedger<SystemClock> {
    /// Create a ledger using wall-clock time.
    #[must_use]
    pub fn new(config: LedgerConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl Default for InMemoryLedger<SystemClock> {
    fn default() -> Self {
        Self::new(LedgerConfig::default())
    }
}

impl<C: Clock> InMemoryLedger<C> {
    /// Create a ledger driven by `clock`.
    #[must_use]
    pub fn with_clock(config: LedgerConfig, clock: C) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            config,
            clock,
        }
    }

    /// Policy this ledger was built with.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Number of live sessions (for testing and diagnostics).
    ///
    /// # Errors
    ///
    /// Returns error if the lock is poisoned.
    pub fn session_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<SessionId, SessionRecord>>> {
        self.sessions
            .lock()
            .map_err(|_| LedgerError::Internal("Mutex lock failed".to_string()))
    }

    /// Remove expired records, returning how many went.
    ///
    /// A TTL reaching past the earliest representable instant expires nothing.
    fn sweep(&self, sessions: &mut HashMap<SessionId, SessionRecord>) -> usize {
        let Some(cutoff) = self.clock.now().checked_sub_signed(self.config.idle_ttl) else {
            return 0;
        };
        let before = sessions.len();
        sessions.retain(|_, record| record.last_used >= cutoff);
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::debug!(removed, "Swept expired sessions");
        }

        removed
    }
}

impl<C: Clock> CreditLedger for InMemoryLedger<C> {
    async fn create_session(&self) -> Result<SessionInfo> {
        let mut sessions = self.lock()?;
        self.sweep(&mut sessions);

        let session_id = SessionId::generate();
        let now = self.clock.now();
        sessions.insert(
            session_id.clone(),
            SessionRecord {
                credits_remaining: self.config.initial_credits,
                created_at: now,
                last_used: now,
            },
        );

        tracing::info!(
            session_id = %session_id,
            credits = self.config.initial_credits,
            "Created anonymous session"
        );

        Ok(SessionInfo {
            session_id,
            credits_remaining: self.config.initial_credits,
        })
    }

    async fn balance(&self, session_id: &SessionId) -> Result<u32> {
        let mut sessions = self.lock()?;
        self.sweep(&mut sessions);

        sessions
            .get(session_id)
            .map(|record| record.credits_remaining)
            .ok_or(LedgerError::SessionNotFound)
    }

    async fn use_credit(&self, session_id: &SessionId) -> Result<DebitOutcome> {
        let mut sessions = self.lock()?;
        self.sweep(&mut sessions);

        let now = self.clock.now();
        let record = sessions
            .get_mut(session_id)
            .ok_or(LedgerError::SessionNotFound)?;

        if record.credits_remaining == 0 {
            tracing::debug!(session_id = %session_id, "Credit denied, balance is zero");
            return Ok(DebitOutcome::Exhausted);
        }

        record.credits_remaining -= 1;
        record.last_used = now;

        tracing::debug!(
            session_id = %session_id,
            credits_remaining = record.credits_remaining,
            age_secs = (now - record.created_at).num_seconds(),
            "Credit consumed"
        );

        Ok(DebitOutcome::Granted {
            credits_remaining: record.credits_remaining,
        })
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<()> {
        self.lock()?.remove(session_id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        let mut sessions = self.lock()?;
        Ok(self.sweep(&mut sessions))
    }
}
