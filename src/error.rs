//! Error types shared by the legacy connection API and the modern client.
//!
//! Every fallible operation in the crate returns [`HttpResult`]. Failures are
//! never retried or recovered here; they propagate to the caller.

use thiserror::Error;

/// Errors that can occur while building, sending or reading an HTTP exchange.
#[derive(Error, Debug)]
pub enum HttpError {
    /// The URL could not be parsed or is malformed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Only HTTP and HTTPS are supported.
    #[error("Unsupported protocol: {0}")]
    UnsupportedProtocol(String),

    /// The request could not be built from the given parts.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A header name or value is not valid on the wire.
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// The connect, read or request timeout elapsed.
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// DNS, TCP or proxy connection failure.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Certificate validation or handshake failure.
    #[error("TLS/SSL error: {0}")]
    Tls(String),

    /// Too many redirects, or a redirect loop.
    #[error("Redirect error: {0}")]
    Redirect(String),

    /// Misuse of the protocol surface, e.g. writing a body without output enabled.
    #[error("HTTP protocol error: {0}")]
    Protocol(String),

    /// A connection setting was changed after the connection was established.
    #[error("Already connected")]
    AlreadyConnected,

    /// The server answered with an error status where a body stream was requested.
    #[error("Server returned HTTP response code: {status} for URL: {url}")]
    HttpStatus { status: u16, url: String },

    /// A `Set-Cookie` header could not be parsed.
    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),

    /// An asynchronous exchange was cancelled or panicked on its executor.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Client configuration is invalid or could not be loaded.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Response body is not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Local I/O failure, e.g. reading a request body from a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other transport failure reported by reqwest.
    #[error("HTTP transport error: {0}")]
    Transport(String),
}

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            HttpError::Timeout(message)
        } else if err.is_redirect() {
            HttpError::Redirect(message)
        } else if err.is_builder() {
            HttpError::InvalidRequest(message)
        } else if message.contains("certificate")
            || message.contains("TLS")
            || message.contains("SSL")
        {
            HttpError::Tls(message)
        } else if err.is_connect() {
            HttpError::Connection(message)
        } else {
            HttpError::Transport(message)
        }
    }
}

impl From<url::ParseError> for HttpError {
    fn from(err: url::ParseError) -> Self {
        HttpError::InvalidUrl(err.to_string())
    }
}

impl From<tokio::task::JoinError> for HttpError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_cancelled() {
            HttpError::Execution("request task was cancelled".to_string())
        } else {
            HttpError::Execution(format!("request task panicked: {}", err))
        }
    }
}

/// Checks that `raw` parses as an absolute `http` or `https` URL.
pub(crate) fn parse_http_url(raw: &str) -> HttpResult<url::Url> {
    let parsed = url::Url::parse(raw)?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(HttpError::UnsupportedProtocol(format!(
            "Only HTTP and HTTPS are supported, got: {}",
            other
        ))),
    }
}
