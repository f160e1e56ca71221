//! HTTP response data models.
//!
//! This module defines the response value returned by both client APIs,
//! including status information, headers, body, and elapsed time.

use crate::error::HttpResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Represents an HTTP response received from a server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Canonical reason phrase for the status code (e.g., "OK", "Not Found").
    ///
    /// This is the registered phrase, not the text on the server's status
    /// line; codes without one read "Unknown".
    pub status_text: String,

    /// Response headers, one pair per header line.
    ///
    /// Pairs are grouped by name in first-seen order; lines of one name keep
    /// their relative order, but interleaving with other names is not kept.
    /// Repeated `Set-Cookie` headers stay apart.
    pub headers: Vec<(String, String)>,

    /// Response body as raw bytes.
    pub body: Vec<u8>,

    /// URL of the final response, after any redirects were followed.
    pub url: String,

    /// Protocol version the server answered with, e.g. "HTTP/1.1".
    pub version: String,

    /// Time from sending the request to receiving the last body byte.
    pub duration: Duration,

    /// Total response size in bytes, headers included.
    pub size: usize,
}

impl HttpResponse {
    /// Creates a new HttpResponse with the given status code and text.
    pub fn new(status_code: u16, status_text: String) -> Self {
        Self {
            status_code,
            status_text,
            headers: Vec::new(),
            body: Vec::new(),
            url: String::new(),
            version: "HTTP/1.1".to_string(),
            duration: Duration::from_secs(0),
            size: 0,
        }
    }

    /// Converts a reqwest response, reading the whole body.
    pub(crate) async fn from_reqwest(
        response: reqwest::Response,
        started: Instant,
    ) -> HttpResult<Self> {
        let status = response.status();
        let url = response.url().to_string();
        let version = format!("{:?}", response.version());
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?.to_vec();

        Ok(Self::assemble(
            status, headers, body, url, version, started,
        ))
    }

    /// Converts a blocking reqwest response, reading the whole body.
    pub(crate) fn from_blocking(
        response: reqwest::blocking::Response,
        started: Instant,
    ) -> HttpResult<Self> {
        let status = response.status();
        let url = response.url().to_string();
        let version = format!("{:?}", response.version());
        let headers = collect_headers(response.headers());
        let body = response.bytes()?.to_vec();

        Ok(Self::assemble(
            status, headers, body, url, version, started,
        ))
    }

    fn assemble(
        status: reqwest::StatusCode,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        url: String,
        version: String,
        started: Instant,
    ) -> Self {
        let mut response = HttpResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown").to_string(),
        );
        response.headers = headers;
        response.url = url;
        response.version = version;
        response.set_body(body);
        response.duration = started.elapsed();
        response
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Checks if the response status indicates a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    /// Checks if the response status indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Checks if the response status indicates a redirection (3xx).
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status_code)
    }

    /// Returns the first value of a header, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value of a header in the order received.
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

    /// All raw `Set-Cookie` header values.
    pub fn set_cookie_headers(&self) -> Vec<&str> {
        self.header_values("set-cookie")
    }

    /// Attempts to parse the response body as UTF-8 text.
    pub fn body_as_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.clone())
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> HttpResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Writes the raw body to `path`, replacing any existing file.
    pub fn write_body_to(&self, path: impl AsRef<Path>) -> HttpResult<()> {
        std::fs::write(path, &self.body)?;
        Ok(())
    }

    /// Adds a header to the response.
    pub fn add_header(&mut self, name: String, value: String) {
        self.headers.push((name, value));
    }

    /// Sets the response body and recomputes the size.
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.size = self.calculate_headers_size() + body.len();
        self.body = body;
    }

    fn calculate_headers_size(&self) -> usize {
        self.headers
            .iter()
            .map(|(k, v)| k.len() + v.len() + 4) // +4 for ": " and "\r\n"
            .sum()
    }
}

/// Flattens a header map into name/value pairs grouped by name, skipping non-text values.
pub(crate) fn collect_headers(map: &reqwest::header::HeaderMap) -> Vec<(String, String)> {
    map.iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
