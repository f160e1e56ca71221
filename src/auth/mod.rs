//! HTTP authentication.
//!
//! The client never sends credentials up front. When a server (401) or a
//! proxy (407) answers with a challenge, the client parses it into an
//! [`AuthChallenge`] and asks its [`Authenticator`] for credentials. Any
//! closure of the right shape is an authenticator:
//!
//! ```
//! use http_tour::auth::{AuthChallenge, Authenticator, PasswordAuthentication};
//!
//! let authenticator = |_: &AuthChallenge| Some(PasswordAuthentication::new("postman", "password"));
//! # fn assert_authenticator<A: Authenticator>(_: &A) {}
//! # assert_authenticator(&authenticator);
//! ```

pub mod basic;

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Matches `name=value` and `name="quoted value"` challenge parameters.
static PARAM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([A-Za-z0-9_-]+)\s*=\s*(?:"((?:[^"\\]|\\.)*)"|([^,\s]*))"#)
        .expect("valid challenge parameter regex")
});

/// A username and password supplied in answer to a challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordAuthentication {
    pub username: String,
    pub password: String,
}

impl PasswordAuthentication {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PasswordAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordAuthentication")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Who issued a challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestorType {
    /// The origin server (`401` + `WWW-Authenticate`).
    Server,
    /// An HTTP proxy (`407` + `Proxy-Authenticate`).
    Proxy,
}

impl RequestorType {
    /// Header carrying the challenge.
    pub fn challenge_header(self) -> &'static str {
        match self {
            RequestorType::Server => "www-authenticate",
            RequestorType::Proxy => "proxy-authenticate",
        }
    }

    /// Header carrying the answer.
    pub fn credentials_header(self) -> &'static str {
        match self {
            RequestorType::Server => "Authorization",
            RequestorType::Proxy => "Proxy-Authorization",
        }
    }

    /// Status code of a challenge response.
    pub fn status_code(self) -> u16 {
        match self {
            RequestorType::Server => 401,
            RequestorType::Proxy => 407,
        }
    }
}

/// A parsed authentication challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// Scheme name in lowercase, e.g. "basic" or "digest".
    pub scheme: String,
    /// The `realm` parameter, if present.
    pub realm: Option<String>,
    /// All parameters with lowercase names.
    pub params: HashMap<String, String>,
    pub requestor: RequestorType,
    /// URL of the request that was challenged.
    pub url: Url,
}

impl AuthChallenge {
    /// Parses the first challenge of a `WWW-Authenticate` or
    /// `Proxy-Authenticate` header value.
    ///
    /// Returns `None` for an empty header.
    pub fn parse(header: &str, requestor: RequestorType, url: &Url) -> Option<Self> {
        let header = header.trim();
        let (scheme, rest) = match header.split_once(char::is_whitespace) {
            Some((scheme, rest)) => (scheme, rest),
            None => (header, ""),
        };
        if scheme.is_empty() {
            return None;
        }

        let params: HashMap<String, String> = PARAM_RE
            .captures_iter(rest)
            .map(|caps| {
                let name = caps[1].to_ascii_lowercase();
                let value = caps
                    .get(2)
                    .map(|m| m.as_str().replace("\\\"", "\""))
                    .or_else(|| caps.get(3).map(|m| m.as_str().to_string()))
                    .unwrap_or_default();
                (name, value)
            })
            .collect();

        Some(Self {
            scheme: scheme.to_ascii_lowercase(),
            realm: params.get("realm").cloned(),
            params,
            requestor,
            url: url.clone(),
        })
    }

    pub fn is_basic(&self) -> bool {
        self.scheme == "basic"
    }
}

/// Supplies credentials on demand when a request is challenged.
pub trait Authenticator: Send + Sync {
    /// Returns credentials for `challenge`, or `None` to give up and
    /// hand the challenge response back to the caller.
    fn credentials(&self, challenge: &AuthChallenge) -> Option<PasswordAuthentication>;
}

impl<F> Authenticator for F
where
    F: Fn(&AuthChallenge) -> Option<PasswordAuthentication> + Send + Sync,
{
    fn credentials(&self, challenge: &AuthChallenge) -> Option<PasswordAuthentication> {
        self(challenge)
    }
}

/// Answers every challenge with the same credentials.
#[derive(Debug, Clone)]
pub struct StaticAuthenticator {
    credentials: PasswordAuthentication,
}

impl StaticAuthenticator {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: PasswordAuthentication::new(username, password),
        }
    }
}

impl Authenticator for StaticAuthenticator {
    fn credentials(&self, _challenge: &AuthChallenge) -> Option<PasswordAuthentication> {
        Some(self.credentials.clone())
    }
}
