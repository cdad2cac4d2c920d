//! Request execution configuration.

use crate::config::get_config;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for request execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionConfig {
    /// Default request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Whether redirects are followed.
    pub follow_redirects: bool,

    /// Maximum number of redirects to follow.
    pub max_redirects: u32,

    /// Whether TLS certificates are validated.
    pub validate_ssl: bool,

    /// Headers applied before environment and request headers.
    pub default_headers: IndexMap<String, String>,
}

impl ExecutionConfig {
    /// Creates a config with the given timeout and no default headers.
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            follow_redirects: true,
            max_redirects: 10,
            validate_ssl: true,
            default_headers: IndexMap::new(),
        }
    }

    /// Creates a config from the global configuration.
    pub fn from_global_config() -> Self {
        let global_config = get_config();
        Self {
            timeout_ms: global_config.timeout,
            follow_redirects: global_config.follow_redirects,
            max_redirects: global_config.max_redirects,
            validate_ssl: global_config.validate_ssl,
            default_headers: global_config.default_headers,
        }
    }

    /// Returns the default timeout as a `Duration`.
    pub fn timeout_duration(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::from_global_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execution_config_new() {
        let config = ExecutionConfig::new(60000);
        assert_eq!(config.timeout_ms, 60000);
        assert!(config.default_headers.is_empty());
        assert_eq!(config.timeout_duration(), Duration::from_secs(60));
    }

    #[test]
    fn test_serialization() {
        let config = ExecutionConfig::new(120);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"timeoutMs\":120"));

        let back: ExecutionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
