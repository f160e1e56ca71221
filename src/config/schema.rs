//! Configuration schema for HTTP clients and legacy connections.
//!
//! This module defines the configuration structure and validation logic for
//! every user-configurable default: timeouts, redirect and proxy policy,
//! cookie handling and the headers sent with every request.

use crate::client::{ProxySelector, Redirect};
use crate::cookies::CookiePolicy;
use crate::models::HttpVersion;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// `User-Agent` sent when nothing else is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("http-tour/", env!("CARGO_PKG_VERSION"));

/// Client configuration.
///
/// All settings can be given in JSON under the "http-client" key.
/// Missing settings fall back to the defaults documented on each field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// Connect timeout in milliseconds. 0 waits forever. Defaults to 10000.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Read timeout for legacy connections in milliseconds. 0 waits forever.
    /// Defaults to 10000.
    #[serde(default = "default_read_timeout")]
    pub read_timeout: u64,

    /// Timeout for a whole modern-client exchange in milliseconds.
    /// Defaults to 30000. Must be greater than 0.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Redirect policy of the modern client. Defaults to "never".
    #[serde(default)]
    pub follow_redirects: Redirect,

    /// Maximum number of redirects followed in one exchange. Defaults to 5.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Preferred protocol version. Defaults to "HTTP/2".
    #[serde(default = "default_http_version")]
    pub http_version: HttpVersion,

    /// Proxy selection. Defaults to `{"mode": "system"}`.
    #[serde(default)]
    pub proxy: ProxySelector,

    /// Cookie policy of the client's cookie handler. `None` (the default)
    /// means the client keeps no cookies at all.
    #[serde(default)]
    pub cookie_policy: Option<CookiePolicy>,

    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Headers added to every request that does not set them itself.
    #[serde(default)]
    pub default_headers: HashMap<String, String>,

    /// Whether to validate TLS certificates. Defaults to true.
    ///
    /// **Warning:** disabling validation exposes requests to interception.
    #[serde(default = "default_validate_ssl")]
    pub validate_ssl: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: default_connect_timeout(),
            read_timeout: default_read_timeout(),
            request_timeout: default_request_timeout(),
            follow_redirects: Redirect::default(),
            max_redirects: default_max_redirects(),
            http_version: default_http_version(),
            proxy: ProxySelector::default(),
            cookie_policy: None,
            user_agent: default_user_agent(),
            default_headers: HashMap::new(),
            validate_ssl: default_validate_ssl(),
        }
    }
}

impl ClientConfig {
    /// Validates the configuration.
    ///
    /// # Returns
    ///
    /// `Ok(())` if all settings are valid, or `Err` with a descriptive message.
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout == 0 {
            return Err("requestTimeout must be greater than 0".to_string());
        }

        if self.follow_redirects != Redirect::Never && self.max_redirects == 0 {
            return Err("maxRedirects must be greater than 0 when redirects are followed".to_string());
        }

        if self.user_agent.trim().is_empty() {
            return Err("userAgent must not be empty".to_string());
        }

        Ok(())
    }

    /// Connect timeout, or `None` for no limit.
    pub fn connect_timeout_duration(&self) -> Option<Duration> {
        non_zero_millis(self.connect_timeout)
    }

    /// Read timeout, or `None` for no limit.
    pub fn read_timeout_duration(&self) -> Option<Duration> {
        non_zero_millis(self.read_timeout)
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.request_timeout)
    }
}

fn non_zero_millis(millis: u64) -> Option<Duration> {
    (millis > 0).then(|| Duration::from_millis(millis))
}

// Default value functions for serde

fn default_connect_timeout() -> u64 {
    10000
}

fn default_read_timeout() -> u64 {
    10000
}

fn default_request_timeout() -> u64 {
    30000
}

fn default_max_redirects() -> usize {
    5
}

fn default_http_version() -> HttpVersion {
    HttpVersion::Http2
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_validate_ssl() -> bool {
    true
}
