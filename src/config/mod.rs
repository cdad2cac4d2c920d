//! Configuration management.
//!
//! Configuration is loaded from a JSON settings value under the
//! `"api-notebook"` key, merged with defaults, validated and kept in a
//! process-wide instance.

pub mod schema;

pub use schema::{ConfigError, NotebookConfig};

use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::Path;
use std::sync::RwLock;

/// Settings key holding this crate's configuration.
pub const SETTINGS_KEY: &str = "api-notebook";

/// Global configuration instance.
static CONFIG: Lazy<RwLock<NotebookConfig>> = Lazy::new(|| RwLock::new(NotebookConfig::default()));

/// Loads configuration from a settings JSON value.
///
/// Settings that fail to deserialize are ignored with a warning and the
/// defaults are used instead. A configuration that deserializes but fails
/// validation is rejected and the global configuration is left unchanged.
///
/// # Example
///
/// ```no_run
/// use api_notebook::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "api-notebook": {
///         "timeout": 60000,
///         "validateSsl": false
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.timeout, 60000);
/// ```
pub fn load_config(settings_json: Option<Value>) -> Result<NotebookConfig, ConfigError> {
    let mut config = NotebookConfig::default();

    if let Some(section) = settings_json.as_ref().and_then(|s| s.get(SETTINGS_KEY)) {
        match serde_json::from_value::<NotebookConfig>(section.clone()) {
            Ok(user_config) => config = user_config,
            Err(e) => {
                log::warn!("Failed to parse {} settings: {}. Using defaults.", SETTINGS_KEY, e);
            }
        }
    }

    config.validate()?;

    if let Ok(mut global_config) = CONFIG.write() {
        *global_config = config.clone();
    }

    Ok(config)
}

/// Loads configuration from a JSON settings file.
///
/// A missing file leaves the defaults in place.
pub fn load_config_file(path: &Path) -> Result<NotebookConfig, ConfigError> {
    if !path.is_file() {
        log::debug!("No settings file at {}, using defaults", path.display());
        return load_config(None);
    }

    let settings = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("cannot read {}: {}", path.display(), e)))
        .and_then(|content| {
            serde_json::from_str::<Value>(&content)
                .map_err(|e| ConfigError::Invalid(format!("invalid settings JSON: {}", e)))
        })?;

    load_config(Some(settings))
}

/// Gets a copy of the current global configuration.
pub fn get_config() -> NotebookConfig {
    CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|_| NotebookConfig::default())
}

/// Updates the global configuration in place.
///
/// If the updated configuration fails validation, the defaults are restored.
pub fn update_config<F>(updater: F)
where
    F: FnOnce(&mut NotebookConfig),
{
    if let Ok(mut config) = CONFIG.write() {
        updater(&mut config);

        if let Err(e) = config.validate() {
            log::warn!("Configuration validation failed after update: {}", e);
            *config = NotebookConfig::default();
        }
    }
}

/// Resets the global configuration to defaults.
pub fn reset_config() {
    if let Ok(mut config) = CONFIG.write() {
        *config = NotebookConfig::default();
    }
}
