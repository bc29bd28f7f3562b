//! Runtime selection between ledger implementations.

use crate::config::LedgerConfig;
use crate::error::Result;
use crate::ledger::{CreditLedger, DebitOutcome};
use crate::memory::InMemoryLedger;
use crate::redis_ledger::RedisLedger;
use credit_meter_core::{SessionId, SessionInfo};

/// A ledger whose backend is picked from configuration at startup.
#[derive(Clone)]
pub enum LedgerBackend {
    /// Process-local sessions.
    Memory(InMemoryLedger),
    /// Sessions in Redis.
    Redis(RedisLedger),
}

impl LedgerBackend {
    /// Connect to Redis when `redis_url` is set, otherwise keep sessions in memory.
    ///
    /// # Errors
    ///
    /// Returns error if the Redis connection cannot be established.
    pub async fn connect(redis_url: Option<&str>, config: LedgerConfig) -> Result<Self> {
        match redis_url {
            Some(url) => {
                let ledger = RedisLedger::new(url, config).await?;
                tracing::info!("Using Redis credit ledger");
                Ok(Self::Redis(ledger))
            }
            None => {
                tracing::warn!("REDIS_URL not set, sessions will not survive a restart");
                Ok(Self::Memory(InMemoryLedger::new(config)))
            }
        }
    }

    /// Short backend name for logs and health output.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redis(_) => "redis",
        }
    }

    /// Policy in force.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        match self {
            Self::Memory(ledger) => ledger.config(),
            Self::Redis(ledger) => ledger.config(),
        }
    }
}

impl CreditLedger for LedgerBackend {
    async fn create_session(&self) -> Result<SessionInfo> {
        match self {
            Self::Memory(ledger) => ledger.create_session().await,
            Self::Redis(ledger) => ledger.create_session().await,
        }
    }

    async fn balance(&self, session_id: &SessionId) -> Result<u32> {
        match self {
            Self::Memory(ledger) => ledger.balance(session_id).await,
            Self::Redis(ledger) => ledger.balance(session_id).await,
        }
    }

    async fn use_credit(&self, session_id: &SessionId) -> Result<DebitOutcome> {
        match self {
            Self::Memory(ledger) => ledger.use_credit(session_id).await,
            Self::Redis(ledger) => ledger.use_credit(session_id).await,
        }
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<()> {
        match self {
            Self::Memory(ledger) => ledger.delete_session(session_id).await,
            Self::Redis(ledger) => ledger.delete_session(session_id).await,
        }
    }

    async fn purge_expired(&self) -> Result<usize> {
        match self {
            Self::Memory(ledger) => ledger.purge_expired().await,
            Self::Redis(ledger) => ledger.purge_expired().await,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_without_redis_uses_memory() {
        let backend = LedgerBackend::connect(None, LedgerConfig::new(4)).await.unwrap();

        assert_eq!(backend.name(), "memory");
        assert_eq!(backend.config().initial_credits, 4);

        let info = backend.create_session().await.unwrap();
        assert_eq!(backend.balance(&info.session_id).await.unwrap(), 4);
    }
}
