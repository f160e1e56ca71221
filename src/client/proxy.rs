//! Proxy selection shared by both client APIs.

use crate::error::{HttpError, HttpResult};
use serde::{Deserialize, Serialize};

/// How outgoing connections pick a proxy.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum ProxySelector {
    /// Use the proxies named by `HTTP_PROXY`, `HTTPS_PROXY`, `ALL_PROXY`
    /// and `NO_PROXY`, if any.
    #[default]
    System,
    /// Always connect directly.
    NoProxy,
    /// Send everything through one proxy, except the listed hosts.
    Fixed {
        url: String,
        #[serde(default, rename = "excludeHosts")]
        exclude_hosts: Vec<String>,
    },
}

impl ProxySelector {
    /// The selector used when none is configured.
    pub fn get_default() -> Self {
        ProxySelector::System
    }

    pub fn fixed(url: impl Into<String>) -> Self {
        ProxySelector::Fixed {
            url: url.into(),
            exclude_hosts: Vec::new(),
        }
    }

    pub(crate) fn apply(&self, builder: reqwest::ClientBuilder) -> HttpResult<reqwest::ClientBuilder> {
        Ok(match self {
            ProxySelector::System => builder,
            ProxySelector::NoProxy => builder.no_proxy(),
            ProxySelector::Fixed { url, exclude_hosts } => {
                builder.proxy(fixed_proxy(url, exclude_hosts)?)
            }
        })
    }

    pub(crate) fn apply_blocking(
        &self,
        builder: reqwest::blocking::ClientBuilder,
    ) -> HttpResult<reqwest::blocking::ClientBuilder> {
        Ok(match self {
            ProxySelector::System => builder,
            ProxySelector::NoProxy => builder.no_proxy(),
            ProxySelector::Fixed { url, exclude_hosts } => {
                builder.proxy(fixed_proxy(url, exclude_hosts)?)
            }
        })
    }
}

fn fixed_proxy(url: &str, exclude_hosts: &[String]) -> HttpResult<reqwest::Proxy> {
    let proxy = reqwest::Proxy::all(url)
        .map_err(|e| HttpError::Config(format!("invalid proxy URL \"{}\": {}", url, e)))?;

    if exclude_hosts.is_empty() {
        return Ok(proxy);
    }
    Ok(proxy.no_proxy(reqwest::NoProxy::from_string(&exclude_hosts.join(","))))
}
