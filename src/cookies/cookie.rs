//! `Set-Cookie` / `Set-Cookie2` header parsing.

use crate::error::{HttpError, HttpResult};
use chrono::{DateTime, Duration as ChronoDuration, NaiveDateTime, Utc};
use std::fmt;

/// `Expires` formats seen in the wild, after RFC 1123 (tried first via RFC 2822).
const EXPIRES_FORMATS: &[&str] = &[
    "%a, %d-%b-%Y %H:%M:%S GMT",
    "%a, %d-%b-%y %H:%M:%S GMT",
    "%A, %d-%b-%y %H:%M:%S GMT",
    "%a %b %e %H:%M:%S %Y",
];

/// A single cookie as received from a server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCookie {
    pub name: String,
    pub value: String,
    /// `Domain` attribute, lowercased, without a leading dot.
    pub domain: Option<String>,
    pub path: Option<String>,
    /// `Max-Age` attribute in seconds, as sent.
    pub max_age: Option<i64>,
    /// Absolute expiry computed from `Max-Age`, or else `Expires`.
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    /// 0 for Netscape-style cookies, 1 for RFC 2965 cookies.
    pub version: u8,
    /// Set when the cookie had no `Domain` and only matches its origin host.
    pub host_only: bool,
}

impl HttpCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
            max_age: None,
            expires: None,
            secure: false,
            http_only: false,
            version: 0,
            host_only: false,
        }
    }

    /// Parses a `Set-Cookie` or `Set-Cookie2` header value.
    ///
    /// The header name itself may be included as a prefix. Netscape-style
    /// values (anything with `expires=`) hold exactly one cookie; RFC 2965
    /// values may hold several, separated by commas.
    pub fn parse(header: &str) -> HttpResult<Vec<HttpCookie>> {
        let mut header = header.trim();
        let mut version = guess_version(header);

        if let Some(rest) = strip_prefix_ignore_case(header, "set-cookie2:") {
            header = rest;
            version = 1;
        } else if let Some(rest) = strip_prefix_ignore_case(header, "set-cookie:") {
            header = rest;
        }

        let header = header.trim();
        if header.is_empty() {
            return Err(HttpError::InvalidCookie("empty cookie header".to_string()));
        }

        if version == 0 {
            return Ok(vec![parse_single(header, 0)?]);
        }

        split_outside_quotes(header, ',')
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .map(|part| parse_single(part, 1))
            .collect()
    }

    /// Checks whether the cookie's lifetime is over.
    pub fn has_expired(&self) -> bool {
        self.expires.map_or(false, |expires| Utc::now() >= expires)
    }

    /// Checks whether this cookie may be sent to `host`.
    ///
    /// A host-only cookie matches its origin host exactly; otherwise the host
    /// must equal the domain or be a subdomain of it.
    pub fn domain_matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match &self.domain {
            None => true,
            Some(domain) if self.host_only => host == *domain,
            Some(domain) => {
                host == *domain
                    || (host.ends_with(domain.as_str())
                        && host[..host.len() - domain.len()].ends_with('.'))
            }
        }
    }

    /// Checks whether this cookie applies to a request path (RFC 6265 §5.1.4).
    pub fn path_matches(&self, request_path: &str) -> bool {
        let Some(path) = self.path.as_deref() else {
            return true;
        };
        if request_path == path {
            return true;
        }
        request_path.starts_with(path)
            && (path.ends_with('/') || request_path[path.len()..].starts_with('/'))
    }
}

impl fmt::Display for HttpCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version == 0 {
            write!(f, "{}={}", self.name, self.value)
        } else {
            write!(f, "{}=\"{}\"", self.name, self.value)
        }
    }
}

fn guess_version(header: &str) -> u8 {
    let lower = header.to_ascii_lowercase();
    if lower.contains("expires=") {
        0
    } else if lower.contains("version=") || lower.contains("max-age") || lower.starts_with("set-cookie2:") {
        1
    } else {
        0
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, ch) in text.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == separator && !in_quotes => {
                parts.push(&text[start..index]);
                start = index + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

fn parse_single(text: &str, version: u8) -> HttpResult<HttpCookie> {
    let mut parts = split_outside_quotes(text, ';').into_iter();
    let first = parts.next().unwrap_or_default();

    let (name, value) = first
        .split_once('=')
        .ok_or_else(|| HttpError::InvalidCookie(format!("missing '=' in \"{}\"", first.trim())))?;
    let name = name.trim();
    if name.is_empty() || name.starts_with('$') {
        return Err(HttpError::InvalidCookie(format!(
            "illegal cookie name in \"{}\"",
            first.trim()
        )));
    }

    let mut cookie = HttpCookie::new(name, unquote(value));
    cookie.version = version;
    let mut expires_attr = None;

    for attribute in parts {
        let (key, value) = match attribute.split_once('=') {
            Some((key, value)) => (key.trim(), Some(unquote(value))),
            None => (attribute.trim(), None),
        };

        match key.to_ascii_lowercase().as_str() {
            "domain" => {
                if let Some(domain) = value.filter(|d| !d.is_empty()) {
                    cookie.domain = Some(domain.trim_start_matches('.').to_ascii_lowercase());
                }
            }
            "path" => cookie.path = value.map(str::to_string),
            "max-age" => {
                let raw = value.unwrap_or_default();
                let seconds = raw.parse::<i64>().map_err(|_| {
                    HttpError::InvalidCookie(format!("illegal max-age attribute: \"{}\"", raw))
                })?;
                cookie.max_age = Some(seconds);
            }
            "expires" => expires_attr = value.map(str::to_string),
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            "version" => {
                if let Some(v) = value.and_then(|v| v.parse::<u8>().ok()) {
                    cookie.version = v;
                }
            }
            _ => {}
        }
    }

    cookie.expires = match (cookie.max_age, expires_attr) {
        (Some(seconds), _) => Some(expiry_after(seconds)),
        (None, Some(raw)) => {
            let parsed = parse_expires(&raw);
            if parsed.is_none() {
                log::debug!("ignoring unparseable cookie expiry \"{}\"", raw);
            }
            parsed
        }
        (None, None) => None,
    };

    Ok(cookie)
}

/// Absolute expiry `seconds` from now, saturating at the latest representable instant.
fn expiry_after(seconds: i64) -> DateTime<Utc> {
    ChronoDuration::try_seconds(seconds.max(0))
        .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn parse_expires(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc2822(raw) {
        return Some(date.with_timezone(&Utc));
    }
    EXPIRES_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}
