//! Ledger policy configuration.

use chrono::Duration;
use credit_meter_core::constants::{DEFAULT_CREDIT_GRANT, DEFAULT_IDLE_TTL_SECS};

/// Grant size and expiry policy shared by all ledger backends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// Credits given to a freshly created session.
    ///
    /// Default: 6
    pub initial_credits: u32,

    /// How long a session may sit unused before it expires.
    ///
    /// Default: 24 hours
    pub idle_ttl: Duration,
}

impl LedgerConfig {
    /// Create a configuration with the given grant and the default TTL.
    #[must_use]
    pub const fn new(initial_credits: u32) -> Self {
        Self {
            initial_credits,
            idle_ttl: Duration::seconds(DEFAULT_IDLE_TTL_SECS),
        }
    }

    /// Set the credit grant.
    #[must_use]
    pub const fn with_initial_credits(mut self, credits: u32) -> Self {
        self.initial_credits = credits;
        self
    }

    /// Set the idle time-to-live.
    #[must_use]
    pub const fn with_idle_ttl(mut self, ttl: Duration) -> Self {
        self.idle_ttl = ttl;
        self
    }

    /// Idle TTL in whole seconds, clamped to at least one.
    #[must_use]
    pub fn idle_ttl_seconds(&self) -> u64 {
        u64::try_from(self.idle_ttl.num_seconds()).unwrap_or(0).max(1)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CREDIT_GRANT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_config_builder() {
        let config = LedgerConfig::default()
            .with_initial_credits(5)
            .with_idle_ttl(Duration::hours(2));

        assert_eq!(config.initial_credits, 5);
        assert_eq!(config.idle_ttl, Duration::hours(2));
        assert_eq!(config.idle_ttl_seconds(), 7200);
    }

    #[test]
    fn test_default_config() {
        let config = LedgerConfig::default();
        assert_eq!(config.initial_credits, 6);
        assert_eq!(config.idle_ttl, Duration::hours(24));
    }

    #[test]
    fn test_negative_ttl_is_clamped() {
        let config = LedgerConfig::default().with_idle_ttl(Duration::seconds(-5));
        assert_eq!(config.idle_ttl_seconds(), 1);
    }
}
