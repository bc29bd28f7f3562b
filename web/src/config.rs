//! Server configuration.
//!
//! Loads configuration from environment variables with sensible defaults.
//! The binary calls `dotenvy::dotenv()` first, so a `.env` file works too.

use chrono::Duration;
use credit_meter_core::constants::{DEFAULT_CREDIT_GRANT, DEFAULT_IDLE_TTL_SECS};
use credit_meter_ledger::LedgerConfig;
use std::env;
use std::str::FromStr;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set but could not be parsed.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Environment variable name
        key: &'static str,
        /// Offending value
        value: String,
    },
}

/// Session store server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host to bind to (`SERVER_HOST`, default `0.0.0.0`)
    pub host: String,
    /// Port to bind to (`SERVER_PORT`, default 8000)
    pub port: u16,
    /// Credits per new session (`CREDIT_GRANT`, default 6)
    pub credit_grant: u32,
    /// Idle expiry in seconds (`SESSION_IDLE_TTL_SECS`, default 86400)
    pub idle_ttl_secs: i64,
    /// Seconds between expiry sweeps (`PURGE_INTERVAL_SECS`, default 300)
    pub purge_interval_secs: u64,
    /// Redis URL (`REDIS_URL`); sessions stay in memory when unset
    pub redis_url: Option<String>,
    /// Browser origins allowed by CORS (`CORS_ORIGINS`, comma-separated)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            credit_grant: DEFAULT_CREDIT_GRANT,
            idle_ttl_secs: DEFAULT_IDLE_TTL_SECS,
            purge_interval_secs: 300,
            redis_url: None,
            cors_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl ServerConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: non_empty("SERVER_HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "SERVER_PORT", defaults.port)?,
            credit_grant: parse_or(&lookup, "CREDIT_GRANT", defaults.credit_grant)?,
            idle_ttl_secs: parse_idle_ttl(&lookup, defaults.idle_ttl_secs)?,
            purge_interval_secs: parse_or(
                &lookup,
                "PURGE_INTERVAL_SECS",
                defaults.purge_interval_secs,
            )?,
            redis_url: non_empty("REDIS_URL"),
            cors_origins: non_empty("CORS_ORIGINS").map_or(defaults.cors_origins, |raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(ToString::to_string)
                    .collect()
            }),
        })
    }

    /// `host:port` to bind.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Ledger policy derived from this configuration.
    ///
    /// A TTL beyond what `chrono::Duration` can hold saturates at its maximum.
    #[must_use]
    pub fn ledger_config(&self) -> LedgerConfig {
        let idle_ttl = Duration::try_seconds(self.idle_ttl_secs).unwrap_or(Duration::MAX);
        LedgerConfig::new(self.credit_grant).with_idle_ttl(idle_ttl)
    }

    /// Expiry sweep period.
    #[must_use]
    pub const fn purge_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.purge_interval_secs)
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        _ => Ok(default),
    }
}

/// `SESSION_IDLE_TTL_SECS`: positive and representable as a `chrono::Duration`.
fn parse_idle_ttl<F>(lookup: &F, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const KEY: &str = "SESSION_IDLE_TTL_SECS";

    let secs = parse_or(lookup, KEY, default)?;
    if secs <= 0 || Duration::try_seconds(secs).is_none() {
        return Err(ConfigError::InvalidValue {
            key: KEY,
            value: secs.to_string(),
        });
    }
    Ok(secs)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert_eq!(config.ledger_config().initial_credits, 6);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("SERVER_PORT", "9100"),
            ("CREDIT_GRANT", "5"),
            ("SESSION_IDLE_TTL_SECS", "3600"),
            ("REDIS_URL", "redis://cache:6379"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]))
        .unwrap();

        assert_eq!(config.port, 9100);
        assert_eq!(config.ledger_config().initial_credits, 5);
        assert_eq!(config.ledger_config().idle_ttl, Duration::hours(1));
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn test_blank_redis_url_means_memory() {
        let config = ServerConfig::from_lookup(lookup(&[("REDIS_URL", "  ")])).unwrap();
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = ServerConfig::from_lookup(lookup(&[("CREDIT_GRANT", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: "CREDIT_GRANT",
                value: "lots".to_string()
            }
        );
    }

    #[test]
    fn test_idle_ttl_must_be_positive_and_in_range() {
        for bad in ["0", "-60", "9300000000000000"] {
            let err = ServerConfig::from_lookup(lookup(&[("SESSION_IDLE_TTL_SECS", bad)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidValue {
                    key: "SESSION_IDLE_TTL_SECS",
                    value: bad.to_string()
                }
            );
        }
    }

    #[test]
    fn test_very_long_idle_ttl_is_accepted() {
        let config =
            ServerConfig::from_lookup(lookup(&[("SESSION_IDLE_TTL_SECS", "10000000000000")])).unwrap();
        assert_eq!(config.ledger_config().idle_ttl, Duration::seconds(10_000_000_000_000));
    }
}
