//! Configuration schema for the notebook runner.
//!
//! This module defines every user-configurable setting and its validation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported when validating a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A setting has a value outside its allowed range.
    #[error("{0}")]
    Invalid(String),
}

/// Main configuration structure.
///
/// All settings are read from the `"api-notebook"` key of the host settings.
/// Missing settings fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotebookConfig {
    /// Request timeout in milliseconds.
    ///
    /// An environment's own timeout overrides this for its requests.
    /// Must be greater than 0. Defaults to 30000.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Whether to automatically follow HTTP redirects. Defaults to true.
    #[serde(default = "default_follow_redirects")]
    pub follow_redirects: bool,

    /// Maximum number of redirects to follow. Defaults to 10.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: u32,

    /// Whether to validate TLS certificates. Defaults to true.
    #[serde(default = "default_validate_ssl")]
    pub validate_ssl: bool,

    /// Directory, relative to the workspace root, that receives comparison
    /// artifacts from group executions. Defaults to `api-comparisons`.
    #[serde(default = "default_comparisons_dir")]
    pub comparisons_dir: String,

    /// Maximum number of history entries kept on disk. Must be > 0.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Number of leading characters of a secret shown in masked form.
    ///
    /// Never more than half of the secret is shown, whatever this is set to.
    #[serde(default = "default_mask_visible_chars")]
    pub mask_visible_chars: usize,

    /// Response field name to variable name, applied after every HTTP cell.
    #[serde(default = "default_response_aliases")]
    pub response_aliases: IndexMap<String, String>,

    /// Headers included in every request unless the request overrides them.
    #[serde(default = "default_headers")]
    pub default_headers: IndexMap<String, String>,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            follow_redirects: default_follow_redirects(),
            max_redirects: default_max_redirects(),
            validate_ssl: default_validate_ssl(),
            comparisons_dir: default_comparisons_dir(),
            history_limit: default_history_limit(),
            mask_visible_chars: default_mask_visible_chars(),
            response_aliases: default_response_aliases(),
            default_headers: default_headers(),
        }
    }
}

impl NotebookConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout == 0 {
            return Err(ConfigError::Invalid("timeout must be greater than 0".to_string()));
        }

        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "historyLimit must be greater than 0".to_string(),
            ));
        }

        if self.comparisons_dir.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "comparisonsDir must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Returns the timeout as a `std::time::Duration`.
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout)
    }
}

fn default_timeout() -> u64 {
    30000
}

fn default_follow_redirects() -> bool {
    true
}

fn default_max_redirects() -> u32 {
    10
}

fn default_validate_ssl() -> bool {
    true
}

fn default_comparisons_dir() -> String {
    "api-comparisons".to_string()
}

fn default_history_limit() -> usize {
    1000
}

fn default_mask_visible_chars() -> usize {
    4
}

fn default_response_aliases() -> IndexMap<String, String> {
    let mut aliases = IndexMap::new();
    aliases.insert("token".to_string(), "authToken".to_string());
    aliases.insert("id".to_string(), "lastId".to_string());
    aliases
}

fn default_headers() -> IndexMap<String, String> {
    let mut headers = IndexMap::new();
    headers.insert(
        "User-Agent".to_string(),
        format!("api-notebook/{}", env!("CARGO_PKG_VERSION")),
    );
    headers
}
