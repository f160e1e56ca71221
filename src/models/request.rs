//! HTTP request data models.
//!
//! This module defines the immutable request value sent by the modern client,
//! the builder that validates it, and the body publishers a request can carry.

use crate::error::{parse_http_url, HttpError, HttpResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Headers the client manages itself and refuses to take from callers.
const RESTRICTED_HEADERS: &[&str] = &["connection", "content-length", "expect", "host", "upgrade"];

/// HTTP request method.
///
/// Represents all standard HTTP methods as defined in RFC 7231 and RFC 5789.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }

    /// Parses a method name, ignoring case.
    ///
    /// # Returns
    ///
    /// `Some(HttpMethod)` if the string is a valid HTTP method, `None` otherwise.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "DELETE" => Some(HttpMethod::DELETE),
            "PATCH" => Some(HttpMethod::PATCH),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "HEAD" => Some(HttpMethod::HEAD),
            "TRACE" => Some(HttpMethod::TRACE),
            "CONNECT" => Some(HttpMethod::CONNECT),
            _ => None,
        }
    }

    /// Converts to the method type used by reqwest.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            HttpMethod::GET => reqwest::Method::GET,
            HttpMethod::POST => reqwest::Method::POST,
            HttpMethod::PUT => reqwest::Method::PUT,
            HttpMethod::DELETE => reqwest::Method::DELETE,
            HttpMethod::PATCH => reqwest::Method::PATCH,
            HttpMethod::OPTIONS => reqwest::Method::OPTIONS,
            HttpMethod::HEAD => reqwest::Method::HEAD,
            HttpMethod::TRACE => reqwest::Method::TRACE,
            HttpMethod::CONNECT => reqwest::Method::CONNECT,
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// HTTP protocol version requested for an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpVersion {
    /// HTTP/1.1 only.
    #[serde(rename = "HTTP/1.1")]
    Http11,
    /// HTTP/2 where the server negotiates it, HTTP/1.1 otherwise.
    #[serde(rename = "HTTP/2")]
    Http2,
}

impl HttpVersion {
    /// Converts to the version type used by reqwest.
    pub fn to_reqwest(self) -> reqwest::Version {
        match self {
            HttpVersion::Http11 => reqwest::Version::HTTP_11,
            HttpVersion::Http2 => reqwest::Version::HTTP_2,
        }
    }
}

/// Source of a request body.
///
/// A file body is only read when the request is sent, so a missing file
/// surfaces as an I/O error from `send`, not from the builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Contents of a file on disk.
    File(PathBuf),
}

impl RequestBody {
    pub fn no_body() -> Self {
        RequestBody::Empty
    }

    pub fn of_string(text: impl Into<String>) -> Self {
        RequestBody::Text(text.into())
    }

    pub fn of_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        RequestBody::Bytes(bytes.into())
    }

    pub fn of_file(path: impl Into<PathBuf>) -> Self {
        RequestBody::File(path.into())
    }

    /// Returns `true` only for [`RequestBody::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    /// Resolves the body to the bytes that go on the wire.
    pub async fn load(&self) -> HttpResult<Vec<u8>> {
        match self {
            RequestBody::Empty => Ok(Vec::new()),
            RequestBody::Text(text) => Ok(text.as_bytes().to_vec()),
            RequestBody::Bytes(bytes) => Ok(bytes.clone()),
            RequestBody::File(path) => Ok(tokio::fs::read(path).await?),
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        RequestBody::Empty
    }
}

/// An immutable HTTP request, ready to be sent by an [`HttpClient`](crate::client::HttpClient).
///
/// Requests are created through [`HttpRequest::builder`] so that every
/// instance has a valid URL and valid headers. Deserialized requests go
/// through the same checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "UncheckedRequest")]
pub struct HttpRequest {
    /// Unique identifier, used to correlate log lines with responses.
    pub id: String,

    /// HTTP method (GET, POST, PUT, DELETE, etc.).
    pub method: HttpMethod,

    /// Absolute `http` or `https` target URL.
    pub url: Url,

    /// Version override for this request; the client's version applies when `None`.
    pub version: Option<HttpVersion>,

    /// Request headers in insertion order. A name may appear more than once.
    pub headers: Vec<(String, String)>,

    /// Request body.
    pub body: RequestBody,

    /// Time allowed for the whole exchange, from connecting to the last body byte.
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Starts a new request builder with no URI set.
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::new()
    }

    /// Starts a new request builder targeting `uri`.
    pub fn new_builder(uri: impl AsRef<str>) -> HttpRequestBuilder {
        HttpRequestBuilder::new().uri(uri)
    }

    /// Copies this request back into a builder, e.g. to add a header before a resend.
    pub fn to_builder(&self) -> HttpRequestBuilder {
        HttpRequestBuilder {
            uri: Some(self.url.to_string()),
            method: self.method,
            version: self.version,
            headers: self.headers.clone(),
            body: self.body.clone(),
            timeout: self.timeout,
            error: None,
        }
    }

    /// Returns the first value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of a header in insertion order.
    pub fn header_values(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Gets the Content-Type header value if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Checks if the request carries a body.
    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }
}

/// Serialized form of [`HttpRequest`], validated by [`HttpRequestBuilder::build`].
#[derive(Deserialize)]
struct UncheckedRequest {
    id: String,
    method: HttpMethod,
    url: String,
    version: Option<HttpVersion>,
    headers: Vec<(String, String)>,
    body: RequestBody,
    timeout: Option<Duration>,
}

impl TryFrom<UncheckedRequest> for HttpRequest {
    type Error = HttpError;

    fn try_from(raw: UncheckedRequest) -> HttpResult<Self> {
        let mut request = HttpRequestBuilder {
            uri: Some(raw.url),
            method: raw.method,
            version: raw.version,
            headers: raw.headers,
            body: raw.body,
            timeout: raw.timeout,
            error: None,
        }
        .build()?;
        request.id = raw.id;
        Ok(request)
    }
}

/// Builder for [`HttpRequest`].
///
/// Setters never fail; every check runs in [`HttpRequestBuilder::build`].
#[derive(Debug, Clone)]
pub struct HttpRequestBuilder {
    uri: Option<String>,
    method: HttpMethod,
    version: Option<HttpVersion>,
    headers: Vec<(String, String)>,
    body: RequestBody,
    timeout: Option<Duration>,
    error: Option<String>,
}

impl HttpRequestBuilder {
    pub fn new() -> Self {
        Self {
            uri: None,
            method: HttpMethod::GET,
            version: None,
            headers: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            error: None,
        }
    }

    /// Sets the target URI.
    pub fn uri(mut self, uri: impl AsRef<str>) -> Self {
        self.uri = Some(uri.as_ref().to_string());
        self
    }

    /// Appends a header; existing values with the same name are kept.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Appends several headers given as name/value pairs.
    pub fn headers<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Replaces every value of a header with a single value.
    pub fn set_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    pub fn version(mut self, version: HttpVersion) -> Self {
        self.version = Some(version);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn get(self) -> Self {
        self.with_method(HttpMethod::GET, RequestBody::Empty)
    }

    pub fn post(self, body: RequestBody) -> Self {
        self.with_method(HttpMethod::POST, body)
    }

    pub fn put(self, body: RequestBody) -> Self {
        self.with_method(HttpMethod::PUT, body)
    }

    pub fn delete(self) -> Self {
        self.with_method(HttpMethod::DELETE, RequestBody::Empty)
    }

    /// Sets an arbitrary method by name. Unknown names fail at `build`.
    pub fn method(mut self, name: &str, body: RequestBody) -> Self {
        match HttpMethod::from_str(name) {
            Some(method) => self.with_method(method, body),
            None => {
                self.error = Some(format!("unknown HTTP method: {}", name));
                self
            }
        }
    }

    fn with_method(mut self, method: HttpMethod, body: RequestBody) -> Self {
        self.method = method;
        self.body = body;
        self
    }

    /// Validates the collected parts and produces the request.
    ///
    /// # Errors
    ///
    /// * `InvalidRequest` if no URI was set, the method is unknown, a
    ///   restricted header was given, or the timeout is zero
    /// * `InvalidUrl` / `UnsupportedProtocol` for a bad URI
    /// * `InvalidHeader` for a malformed header name or value
    pub fn build(self) -> HttpResult<HttpRequest> {
        if let Some(error) = self.error {
            return Err(HttpError::InvalidRequest(error));
        }

        let raw = self
            .uri
            .ok_or_else(|| HttpError::InvalidRequest("URI must be set".to_string()))?;
        let url = parse_http_url(&raw)?;

        for (name, value) in &self.headers {
            validate_header(name, value)?;
        }

        if matches!(self.timeout, Some(timeout) if timeout.is_zero()) {
            return Err(HttpError::InvalidRequest(
                "timeout must be greater than zero".to_string(),
            ));
        }

        Ok(HttpRequest {
            id: Uuid::new_v4().to_string(),
            method: self.method,
            url,
            version: self.version,
            headers: self.headers,
            body: self.body,
            timeout: self.timeout,
        })
    }
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn validate_header(name: &str, value: &str) -> HttpResult<()> {
    if RESTRICTED_HEADERS
        .iter()
        .any(|restricted| restricted.eq_ignore_ascii_case(name))
    {
        return Err(HttpError::InvalidRequest(format!(
            "restricted header name: \"{}\"",
            name
        )));
    }

    reqwest::header::HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| HttpError::InvalidHeader(format!("invalid header name: \"{}\"", name)))?;
    reqwest::header::HeaderValue::from_str(value).map_err(|_| {
        HttpError::InvalidHeader(format!("invalid value for header \"{}\"", name))
    })?;

    Ok(())
}
