//! Client-side cookie storage.
//!
//! [`CookieManager`] decides, per [`CookiePolicy`], which `Set-Cookie`
//! headers to keep, and replays stored cookies on later requests. It plugs
//! into reqwest as a cookie provider, so the modern client consults it on
//! every hop of an exchange, redirects included.

pub mod cookie;

pub use cookie::HttpCookie;

use dashmap::DashMap;
use reqwest::header::HeaderValue;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use url::Url;

/// Which cookies a [`CookieManager`] accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CookiePolicy {
    /// Keep every cookie.
    AcceptAll,
    /// Keep nothing.
    AcceptNone,
    /// Keep cookies whose domain matches the server that set them.
    #[default]
    AcceptOriginalServer,
}

impl CookiePolicy {
    /// Decides whether `cookie`, received from `url`, may be stored.
    pub fn should_accept(&self, url: &Url, cookie: &HttpCookie) -> bool {
        match self {
            CookiePolicy::AcceptAll => true,
            CookiePolicy::AcceptNone => false,
            CookiePolicy::AcceptOriginalServer => match (&cookie.domain, url.host_str()) {
                (None, _) => true,
                (Some(_), Some(host)) => cookie.domain_matches(host),
                (Some(_), None) => false,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CookieKey {
    domain: String,
    path: String,
    name: String,
}

/// A concurrent, policy-driven cookie store.
#[derive(Debug, Default)]
pub struct CookieManager {
    policy: RwLock<CookiePolicy>,
    store: DashMap<CookieKey, HttpCookie>,
}

impl CookieManager {
    pub fn new(policy: CookiePolicy) -> Self {
        Self {
            policy: RwLock::new(policy),
            store: DashMap::new(),
        }
    }

    pub fn policy(&self) -> CookiePolicy {
        *self.policy.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Changes the policy for cookies received from now on.
    pub fn set_policy(&self, policy: CookiePolicy) {
        *self.policy.write().unwrap_or_else(|e| e.into_inner()) = policy;
    }

    /// Offers the `Set-Cookie` values of a response from `url` to the store.
    ///
    /// Unparseable headers are skipped. Returns the number of cookies stored.
    pub fn put<'a, I>(&self, url: &Url, set_cookie_values: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let policy = self.policy();
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return 0;
        };
        let mut stored = 0;

        for header in set_cookie_values {
            let cookies = match HttpCookie::parse(header) {
                Ok(cookies) => cookies,
                Err(e) => {
                    log::warn!("skipping cookie from {}: {}", url, e);
                    continue;
                }
            };

            for mut cookie in cookies {
                if !policy.should_accept(url, &cookie) {
                    log::trace!("cookie {} from {} rejected by {:?}", cookie.name, host, policy);
                    continue;
                }

                if cookie.domain.is_none() {
                    cookie.domain = Some(host.clone());
                    cookie.host_only = true;
                }
                if cookie.path.is_none() {
                    cookie.path = Some(default_path(url));
                }

                let key = CookieKey {
                    domain: cookie.domain.clone().unwrap_or_default(),
                    path: cookie.path.clone().unwrap_or_default(),
                    name: cookie.name.clone(),
                };

                if cookie.has_expired() {
                    self.store.remove(&key);
                } else {
                    log::trace!("storing cookie {} for {}", cookie.name, key.domain);
                    self.store.insert(key, cookie);
                    stored += 1;
                }
            }
        }

        stored
    }

    /// All stored cookies that have not expired, ordered by domain, path and name.
    pub fn cookies(&self) -> Vec<HttpCookie> {
        self.purge_expired();
        let mut cookies: Vec<HttpCookie> = self.store.iter().map(|e| e.value().clone()).collect();
        cookies.sort_by(|a, b| {
            (&a.domain, &a.path, &a.name).cmp(&(&b.domain, &b.path, &b.name))
        });
        cookies
    }

    /// Cookies to send with a request to `url`, longest path first.
    pub fn get(&self, url: &Url) -> Vec<HttpCookie> {
        let Some(host) = url.host_str() else {
            return Vec::new();
        };
        let secure_channel = url.scheme() == "https";

        let mut cookies: Vec<HttpCookie> = self
            .store
            .iter()
            .map(|e| e.value().clone())
            .filter(|c| !c.has_expired())
            .filter(|c| c.domain_matches(host) && c.path_matches(url.path()))
            .filter(|c| secure_channel || !c.secure)
            .collect();
        cookies.sort_by(|a, b| {
            let a_len = a.path.as_ref().map_or(0, String::len);
            let b_len = b.path.as_ref().map_or(0, String::len);
            b_len.cmp(&a_len).then_with(|| a.name.cmp(&b.name))
        });
        cookies
    }

    /// The `Cookie` header value for a request to `url`, if any cookie applies.
    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        let cookies = self.get(url);
        if cookies.is_empty() {
            return None;
        }
        Some(
            cookies
                .iter()
                .map(|c| format!("{}={}", c.name, c.value))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }

    /// Removes a stored cookie. Returns `true` if it was present.
    pub fn remove(&self, cookie: &HttpCookie) -> bool {
        let key = CookieKey {
            domain: cookie.domain.clone().unwrap_or_default(),
            path: cookie.path.clone().unwrap_or_default(),
            name: cookie.name.clone(),
        };
        self.store.remove(&key).is_some()
    }

    pub fn remove_all(&self) {
        self.store.clear();
    }

    /// Number of stored cookies that have not expired.
    pub fn len(&self) -> usize {
        self.purge_expired();
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn purge_expired(&self) {
        self.store.retain(|_, cookie| !cookie.has_expired());
    }
}

impl reqwest::cookie::CookieStore for CookieManager {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        let values: Vec<&str> = cookie_headers.filter_map(|v| v.to_str().ok()).collect();
        self.put(url, values);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.cookie_header(url)
            .and_then(|header| HeaderValue::from_str(&header).ok())
    }
}

/// Default cookie path: the request path up to, not including, its last `/`.
fn default_path(url: &Url) -> String {
    let path = url.path();
    match path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(index) => path[..index].to_string(),
    }
}
