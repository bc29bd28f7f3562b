//! Client configuration.

use credit_meter_core::constants::SESSION_STORAGE_KEY;
use std::env;

/// Default session store address.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Where the session store lives and where the session id is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the session store, without a trailing slash
    pub base_url: String,
    /// Key under which the session id is persisted
    pub storage_key: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with the default storage key.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            storage_key: SESSION_STORAGE_KEY.to_string(),
        }
    }

    /// Load from `CREDIT_METER_API_URL`, falling back to [`DEFAULT_API_URL`].
    #[must_use]
    pub fn from_env() -> Self {
        env::var("CREDIT_METER_API_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map_or_else(Self::default, |url| Self::new(url.trim()))
    }

    /// Persist the session id under a different key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Absolute URL for `path` (which starts with `/`).
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_local_store() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.storage_key, "anonymous_session_id");
    }

    #[test]
    fn test_trailing_slash_is_dropped() {
        let config = ClientConfig::new("https://api.example.com/");
        assert_eq!(
            config.url("/session/create"),
            "https://api.example.com/session/create"
        );
    }

    #[test]
    fn test_custom_storage_key() {
        let config = ClientConfig::default().with_storage_key("tab_session");
        assert_eq!(config.storage_key, "tab_session");
    }
}
