//! Redis-based credit ledger.
//!
//! # Architecture
//!
//! Each session is a hash under `credit_session:{session_id}`:
//!
//! | Field | Value |
//! |---|---|
//! | `credits_remaining` | integer balance |
//! | `created_at` | RFC 3339 timestamp |
//! | `last_used` | RFC 3339 timestamp of the last granted decrement |
//!
//! The key carries a TTL equal to the idle timeout and is re-armed on every
//! granted decrement, so Redis itself expires idle sessions.
//!
//! The decrement runs as a Lua script: Redis executes scripts atomically, so
//! two replicas racing on the same session cannot both spend its last credit.
//!
//! # Example
//!
//! ```no_run
//! use credit_meter_ledger::{LedgerConfig, RedisLedger};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ledger = RedisLedger::new("redis://127.0.0.1:6379", LedgerConfig::default()).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};
use crate::ledger::{CreditLedger, DebitOutcome};
use chrono::Utc;
use credit_meter_core::{SessionId, SessionInfo};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, Script};
use std::sync::Arc;

/// Script result: the key does not exist.
const SCRIPT_NOT_FOUND: i64 = -1;

/// Script result: the balance is already zero.
const SCRIPT_EXHAUSTED: i64 = -2;

/// Atomic check-and-decrement.
///
/// KEYS[1] = session key, ARGV[1] = idle TTL seconds, ARGV[2] = now (RFC 3339)
const DEBIT_SCRIPT: &str = r"
    local credits = redis.call('HGET', KEYS[1], 'credits_remaining')
    if not credits then
        return -1
    end

    credits = tonumber(credits)
    if credits <= 0 then
        return -2
    end

    credits = credits - 1
    redis.call('HSET', KEYS[1], 'credits_remaining', credits, 'last_used', ARGV[2])
    redis.call('EXPIRE', KEYS[1], tonumber(ARGV[1]))
    return credits
";

/// Durable ledger backed by Redis.
#[derive(Clone)]
pub struct RedisLedger {
    /// Connection manager for connection pooling.
    conn_manager: ConnectionManager,
    config: LedgerConfig,
    debit_script: Arc<Script>,
}

impl RedisLedger {
    /// Connect to Redis.
    ///
    /// # Arguments
    ///
    /// * `redis_url` - Redis connection URL (e.g., "redis://127.0.0.1:6379")
    /// * `config` - grant size and idle TTL
    ///
    /// # Errors
    ///
    /// Returns error if connection to Redis fails.
    pub async fn new(redis_url: &str, config: LedgerConfig) -> Result<Self> {
        let client = Client::open(redis_url)
            .map_err(|e| LedgerError::Backend(format!("Failed to create Redis client: {e}")))?;

        let conn_manager = ConnectionManager::new(client).await.map_err(|e| {
            LedgerError::Backend(format!("Failed to create Redis connection manager: {e}"))
        })?;

        Ok(Self {
            conn_manager,
            config,
            debit_script: Arc::new(Script::new(DEBIT_SCRIPT)),
        })
    }

    /// Policy this ledger was built with.
    #[must_use]
    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Get the Redis key for a session.
    fn session_key(session_id: &SessionId) -> String {
        format!("credit_session:{session_id}")
    }

    fn ttl_seconds(&self) -> i64 {
        i64::try_from(self.config.idle_ttl_seconds()).unwrap_or(i64::MAX)
    }
}

impl CreditLedger for RedisLedger {
    async fn create_session(&self) -> Result<SessionInfo> {
        let mut conn = self.conn_manager.clone();
        let session_id = SessionId::generate();
        let key = Self::session_key(&session_id);
        let now = Utc::now().to_rfc3339();
        let credits = self.config.initial_credits;

        let fields = [
            ("credits_remaining", credits.to_string()),
            ("created_at", now.clone()),
            ("last_used", now),
        ];

        let _: () = redis::pipe()
            .atomic()
            .hset_multiple(&key, &fields)
            .ignore()
            .expire(&key, self.ttl_seconds())
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| LedgerError::Backend(format!("Failed to create session: {e}")))?;

        tracing::info!(
            session_id = %session_id,
            credits = credits,
            ttl_seconds = self.ttl_seconds(),
            "Created anonymous session in Redis"
        );

        Ok(SessionInfo {
            session_id,
            credits_remaining: credits,
        })
    }

    async fn balance(&self, session_id: &SessionId) -> Result<u32> {
        let mut conn = self.conn_manager.clone();
        let key = Self::session_key(session_id);

        let raw: Option<String> = conn
            .hget(&key, "credits_remaining")
            .await
            .map_err(|e| LedgerError::Backend(format!("Failed to read balance: {e}")))?;

        match raw {
            Some(value) => value
                .parse::<u32>()
                .map_err(|e| LedgerError::CorruptRecord(format!("credits_remaining={value}: {e}"))),
            None => Err(LedgerError::SessionNotFound),
        }
    }

    async fn use_credit(&self, session_id: &SessionId) -> Result<DebitOutcome> {
        let mut conn = self.conn_manager.clone();
        let key = Self::session_key(session_id);

        let result: i64 = self
            .debit_script
            .key(&key)
            .arg(self.ttl_seconds())
            .arg(Utc::now().to_rfc3339())
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, session_id = %session_id, "Debit script failed");
                LedgerError::Backend(format!("Failed to execute atomic debit: {e}"))
            })?;

        match result {
            SCRIPT_NOT_FOUND => Err(LedgerError::SessionNotFound),
            SCRIPT_EXHAUSTED => Ok(DebitOutcome::Exhausted),
            remaining => u32::try_from(remaining)
                .map(|credits_remaining| DebitOutcome::Granted { credits_remaining })
                .map_err(|_| LedgerError::CorruptRecord(format!("balance={remaining}"))),
        }
    }

    async fn delete_session(&self, session_id: &SessionId) -> Result<()> {
        let mut conn = self.conn_manager.clone();
        let key = Self::session_key(session_id);

        let _: () = conn
            .del(&key)
            .await
            .map_err(|e| LedgerError::Backend(format!("Failed to delete session: {e}")))?;

        tracing::info!(session_id = %session_id, "Deleted session from Redis");

        Ok(())
    }

    async fn purge_expired(&self) -> Result<usize> {
        // Key TTLs already expire idle sessions.
        Ok(0)
    }
}
