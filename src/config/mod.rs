//! Process-wide client configuration.
//!
//! Configuration is loaded from a JSON value or file (settings live under the
//! "http-client" key), merged with defaults, validated, and then served
//! through a singleton that both client APIs read their defaults from.

pub mod schema;

pub use schema::{ClientConfig, DEFAULT_USER_AGENT};

use crate::error::{HttpError, HttpResult};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::path::Path;
use std::sync::RwLock;

/// Key under which settings are looked up in a settings document.
pub const SETTINGS_KEY: &str = "http-client";

/// Global configuration instance.
static CONFIG: Lazy<RwLock<ClientConfig>> = Lazy::new(|| RwLock::new(ClientConfig::default()));

/// Loads configuration from a settings document.
///
/// Settings under "http-client" override the defaults. If they cannot be
/// deserialized, a warning is logged and the defaults are used. If they
/// deserialize but fail validation, an error is returned and the global
/// configuration is left untouched.
///
/// # Example
///
/// ```
/// use http_tour::config::load_config;
/// use serde_json::json;
///
/// let settings = json!({
///     "http-client": {
///         "connectTimeout": 20000,
///         "followRedirects": "normal"
///     }
/// });
///
/// let config = load_config(Some(settings)).unwrap();
/// assert_eq!(config.connect_timeout, 20000);
/// # http_tour::config::reset_config();
/// ```
pub fn load_config(settings_json: Option<Value>) -> HttpResult<ClientConfig> {
    let mut config = ClientConfig::default();

    if let Some(settings) = settings_json.as_ref().and_then(|s| s.get(SETTINGS_KEY)) {
        match serde_json::from_value::<ClientConfig>(settings.clone()) {
            Ok(user_config) => config = user_config,
            Err(e) => {
                log::warn!(
                    "Failed to parse {} settings: {}. Using defaults.",
                    SETTINGS_KEY,
                    e
                );
            }
        }
    }

    config
        .validate()
        .map_err(|e| HttpError::Config(format!("Invalid configuration: {}", e)))?;

    *CONFIG.write().unwrap_or_else(|e| e.into_inner()) = config.clone();
    log::debug!("client configuration loaded: {:?}", config);

    Ok(config)
}

/// Loads configuration from a JSON settings file.
pub fn load_config_file(path: impl AsRef<Path>) -> HttpResult<ClientConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let settings: Value = serde_json::from_str(&content).map_err(|e| {
        HttpError::Config(format!("{} is not valid JSON: {}", path.display(), e))
    })?;
    load_config(Some(settings))
}

/// Returns a copy of the current global configuration.
pub fn get_config() -> ClientConfig {
    CONFIG
        .read()
        .map(|c| c.clone())
        .unwrap_or_else(|e| e.into_inner().clone())
}

/// Applies `updater` to the global configuration.
///
/// If the result does not validate, the configuration reverts to defaults.
pub fn update_config<F>(updater: F)
where
    F: FnOnce(&mut ClientConfig),
{
    let mut config = CONFIG.write().unwrap_or_else(|e| e.into_inner());
    updater(&mut config);

    if let Err(e) = config.validate() {
        log::warn!("Configuration validation failed after update: {}", e);
        *config = ClientConfig::default();
    }
}

/// Resets the configuration to defaults.
pub fn reset_config() {
    *CONFIG.write().unwrap_or_else(|e| e.into_inner()) = ClientConfig::default();
}
