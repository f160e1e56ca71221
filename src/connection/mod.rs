//! Legacy connection-style HTTP API.
//!
//! An [`HttpConnection`] is opened on a URL, configured through setters,
//! written to through [`output_stream`](HttpConnection::output_stream), and
//! read through [`response_code`](HttpConnection::response_code),
//! [`input_stream`](HttpConnection::input_stream) and the header accessors.
//! The exchange happens lazily, on the first read of anything that needs the
//! response, and runs on reqwest's blocking client: do not use a connection
//! from inside an async task.
//!
//! ```no_run
//! use http_tour::connection::HttpConnection;
//! use std::io::{Read, Write};
//!
//! # fn run() -> http_tour::error::HttpResult<()> {
//! let mut connection = HttpConnection::open("https://reqres.in/api/users")?;
//! connection.set_request_property("Content-Type", "application/json; utf-8")?;
//! connection.set_do_output(true)?;
//! connection
//!     .output_stream()?
//!     .write_all(br#"{"name": "morpheus", "job": "leader"}"#)?;
//!
//! assert_eq!(connection.response_code()?, 201);
//! let mut body = String::new();
//! connection.input_stream()?.read_to_string(&mut body)?;
//! # Ok(())
//! # }
//! ```

use crate::client::ProxySelector;
use crate::config::get_config;
use crate::error::{parse_http_url, HttpError, HttpResult};
use crate::models::request::validate_header;
use crate::models::{HttpMethod, HttpResponse};
use reqwest::redirect::Policy;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::time::{Duration, Instant};
use url::Url;

/// Methods a connection accepts.
const LEGACY_METHODS: &[HttpMethod] = &[
    HttpMethod::GET,
    HttpMethod::POST,
    HttpMethod::HEAD,
    HttpMethod::OPTIONS,
    HttpMethod::PUT,
    HttpMethod::DELETE,
    HttpMethod::TRACE,
];

/// A single request/response exchange with an HTTP server.
#[derive(Debug)]
pub struct HttpConnection {
    url: Url,
    method: HttpMethod,
    connect_timeout: Duration,
    read_timeout: Duration,
    request_properties: Vec<(String, String)>,
    do_input: bool,
    do_output: bool,
    follow_redirects: bool,
    use_caches: bool,
    max_redirects: usize,
    user_agent: String,
    proxy: ProxySelector,
    output: Option<Vec<u8>>,
    connected: bool,
    response: Option<HttpResponse>,
}

impl HttpConnection {
    /// Opens a connection object for `url`. Nothing is sent yet.
    ///
    /// Timeouts, redirect limit, `User-Agent` and proxy start from the
    /// global configuration.
    pub fn open(url: &str) -> HttpResult<Self> {
        let proxy = get_config().proxy;
        Self::open_with_proxy(url, proxy)
    }

    /// Opens a connection object for `url` that connects through `proxy`
    /// instead of the configured one.
    pub fn open_with_proxy(url: &str, proxy: ProxySelector) -> HttpResult<Self> {
        let url = parse_http_url(url)?;
        let config = get_config();

        Ok(Self {
            url,
            method: HttpMethod::GET,
            connect_timeout: Duration::from_millis(config.connect_timeout),
            read_timeout: Duration::from_millis(config.read_timeout),
            request_properties: Vec::new(),
            do_input: true,
            do_output: false,
            follow_redirects: true,
            use_caches: true,
            max_redirects: config.max_redirects.max(1),
            user_agent: config.user_agent,
            proxy,
            output: None,
            connected: false,
            response: None,
        })
    }

    pub fn proxy(&self) -> &ProxySelector {
        &self.proxy
    }

    /// The URL this connection was opened on.
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Sets the method. Accepts GET, POST, HEAD, OPTIONS, PUT, DELETE and
    /// TRACE, case-sensitively.
    pub fn set_request_method(&mut self, method: &str) -> HttpResult<()> {
        self.ensure_not_connected()?;
        self.method = HttpMethod::from_str(method)
            .filter(|m| LEGACY_METHODS.contains(m) && m.as_str() == method)
            .ok_or_else(|| HttpError::Protocol(format!("Invalid HTTP method: {}", method)))?;
        Ok(())
    }

    pub fn request_method(&self) -> HttpMethod {
        self.method
    }

    /// Connect timeout. Zero waits forever.
    pub fn set_connect_timeout(&mut self, timeout: Duration) -> HttpResult<()> {
        self.ensure_not_connected()?;
        self.connect_timeout = timeout;
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Time allowed for the whole exchange once connecting starts. Zero
    /// waits forever.
    pub fn set_read_timeout(&mut self, timeout: Duration) -> HttpResult<()> {
        self.ensure_not_connected()?;
        self.read_timeout = timeout;
        Ok(())
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    /// Sets a request header, replacing any earlier values of it.
    pub fn set_request_property(&mut self, key: &str, value: &str) -> HttpResult<()> {
        self.ensure_not_connected()?;
        validate_header(key, value)?;
        self.request_properties
            .retain(|(name, _)| !name.eq_ignore_ascii_case(key));
        self.request_properties
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    /// Adds a request header value, keeping earlier ones.
    pub fn add_request_property(&mut self, key: &str, value: &str) -> HttpResult<()> {
        self.ensure_not_connected()?;
        validate_header(key, value)?;
        self.request_properties
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    /// First value of a request header.
    pub fn request_property(&self, key: &str) -> Option<&str> {
        self.request_properties
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value.as_str())
    }

    pub fn request_properties(&self) -> &[(String, String)] {
        &self.request_properties
    }

    pub fn set_do_input(&mut self, do_input: bool) -> HttpResult<()> {
        self.ensure_not_connected()?;
        self.do_input = do_input;
        Ok(())
    }

    pub fn do_input(&self) -> bool {
        self.do_input
    }

    /// Allows writing a request body. A GET connection becomes a POST once
    /// its output stream is taken.
    pub fn set_do_output(&mut self, do_output: bool) -> HttpResult<()> {
        self.ensure_not_connected()?;
        self.do_output = do_output;
        Ok(())
    }

    pub fn do_output(&self) -> bool {
        self.do_output
    }

    /// Whether same-scheme redirects are followed. Defaults to true.
    pub fn set_instance_follow_redirects(&mut self, follow: bool) {
        self.follow_redirects = follow;
    }

    pub fn instance_follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    /// Recorded for compatibility; responses are never cached.
    pub fn set_use_caches(&mut self, use_caches: bool) -> HttpResult<()> {
        self.ensure_not_connected()?;
        self.use_caches = use_caches;
        Ok(())
    }

    pub fn use_caches(&self) -> bool {
        self.use_caches
    }

    /// Marks the connection as connected. Setters fail from here on; the
    /// request itself is still sent on first read.
    pub fn connect(&mut self) {
        self.connected = true;
    }

    /// Buffer the request body is written to.
    ///
    /// # Errors
    ///
    /// Fails if output was not enabled with
    /// [`set_do_output`](Self::set_do_output) or the response was already
    /// read.
    pub fn output_stream(&mut self) -> HttpResult<&mut Vec<u8>> {
        if !self.do_output {
            return Err(HttpError::Protocol(
                "cannot write to a connection unless do_output is set".to_string(),
            ));
        }
        if self.response.is_some() {
            return Err(HttpError::Protocol(
                "cannot write output after reading input".to_string(),
            ));
        }

        if self.method == HttpMethod::GET {
            self.method = HttpMethod::POST;
        }
        self.connected = true;
        Ok(self.output.get_or_insert_with(Vec::new))
    }

    /// Status code of the response, sending the request if needed.
    pub fn response_code(&mut self) -> HttpResult<u16> {
        Ok(self.exchange()?.status_code)
    }

    /// Canonical reason phrase for the response status, e.g. "Created".
    ///
    /// The text on the server's status line is not available; a status
    /// without a registered phrase reads "Unknown".
    pub fn response_message(&mut self) -> HttpResult<String> {
        Ok(self.exchange()?.status_text.clone())
    }

    /// Response body.
    ///
    /// # Errors
    ///
    /// Fails with [`HttpError::HttpStatus`] for a status of 400 or above;
    /// the body of such a response is available from
    /// [`error_stream`](Self::error_stream).
    pub fn input_stream(&mut self) -> HttpResult<Cursor<Vec<u8>>> {
        if !self.do_input {
            return Err(HttpError::Protocol(
                "cannot read from a connection unless do_input is set".to_string(),
            ));
        }

        let response = self.exchange()?;
        if response.status_code >= 400 {
            return Err(HttpError::HttpStatus {
                status: response.status_code,
                url: response.url.clone(),
            });
        }
        Ok(Cursor::new(response.body.clone()))
    }

    /// Body of an error response, if one was received and is not empty.
    ///
    /// Never sends the request.
    pub fn error_stream(&self) -> Option<Cursor<Vec<u8>>> {
        self.response
            .as_ref()
            .filter(|response| response.status_code >= 400 && !response.body.is_empty())
            .map(|response| Cursor::new(response.body.clone()))
    }

    /// Last value of a response header, compared case-insensitively.
    pub fn header_field(&mut self, name: &str) -> HttpResult<Option<String>> {
        Ok(self
            .exchange()?
            .headers
            .iter()
            .rev()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.clone()))
    }

    /// Name of the `n`th response header. Index 0 is the status line, which
    /// has no name.
    ///
    /// Positions follow [`HttpResponse::headers`]: lines sharing a name are
    /// adjacent, in first-seen order of the names.
    pub fn header_field_key(&mut self, n: usize) -> HttpResult<Option<String>> {
        let response = self.exchange()?;
        Ok(n.checked_sub(1)
            .and_then(|i| response.headers.get(i))
            .map(|(key, _)| key.clone()))
    }

    /// Value of the `n`th response header. Index 0 is the status line.
    ///
    /// Uses the same positions as [`header_field_key`](Self::header_field_key).
    pub fn header_field_at(&mut self, n: usize) -> HttpResult<Option<String>> {
        let response = self.exchange()?;
        if n == 0 {
            return Ok(Some(status_line(response)));
        }
        Ok(response.headers.get(n - 1).map(|(_, value)| value.clone()))
    }

    /// All response headers, keyed by lowercase name, values in the order
    /// received.
    pub fn header_fields(&mut self) -> HttpResult<BTreeMap<String, Vec<String>>> {
        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in &self.exchange()?.headers {
            fields
                .entry(key.to_ascii_lowercase())
                .or_default()
                .push(value.clone());
        }
        Ok(fields)
    }

    pub fn content_type(&mut self) -> HttpResult<Option<String>> {
        self.header_field("content-type")
    }

    /// `Content-Length` of the response, if sent and numeric.
    pub fn content_length(&mut self) -> HttpResult<Option<u64>> {
        Ok(self
            .header_field("content-length")?
            .and_then(|value| value.trim().parse().ok()))
    }

    /// URL of the final response, after redirects.
    pub fn response_url(&mut self) -> HttpResult<String> {
        Ok(self.exchange()?.url.clone())
    }

    /// Drops the response and any buffered output and returns the
    /// connection to its unconnected state. Settings are kept, so the
    /// connection can be reused for another exchange.
    pub fn disconnect(&mut self) {
        if self.connected {
            log::debug!("disconnecting from {}", self.url);
        }
        self.response = None;
        self.output = None;
        self.connected = false;
    }

    fn ensure_not_connected(&self) -> HttpResult<()> {
        if self.connected {
            return Err(HttpError::AlreadyConnected);
        }
        Ok(())
    }

    fn exchange(&mut self) -> HttpResult<&HttpResponse> {
        if self.response.is_none() {
            self.connected = true;
            let response = self.perform()?;
            self.response = Some(response);
        }
        self.response
            .as_ref()
            .ok_or_else(|| HttpError::Protocol("no response available".to_string()))
    }

    fn perform(&self) -> HttpResult<HttpResponse> {
        let redirect = if self.follow_redirects {
            same_scheme_policy(self.max_redirects)
        } else {
            Policy::none()
        };

        let mut builder = reqwest::blocking::Client::builder()
            .redirect(redirect)
            .timeout(non_zero(self.read_timeout))
            .connect_timeout(non_zero(self.connect_timeout));
        builder = self.proxy.apply_blocking(builder)?;
        let client = builder.build()?;

        let mut request = client.request(self.method.to_reqwest(), self.url.clone());
        if self.request_property("user-agent").is_none() {
            request = request.header(reqwest::header::USER_AGENT, self.user_agent.as_str());
        }
        for (name, value) in &self.request_properties {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &self.output {
            request = request.body(body.clone());
        }

        log::debug!("{} {} (legacy connection)", self.method, self.url);
        let started = Instant::now();
        let response = HttpResponse::from_blocking(request.send()?, started)?;
        log::debug!("{} {} -> {}", self.method, self.url, response.status_code);

        Ok(response)
    }
}

fn non_zero(timeout: Duration) -> Option<Duration> {
    (!timeout.is_zero()).then_some(timeout)
}

fn status_line(response: &HttpResponse) -> String {
    format!(
        "{} {} {}",
        response.version, response.status_code, response.status_text
    )
}

/// Follows redirects that keep the scheme, up to `max_redirects` hops.
/// A scheme change stops the chain and returns the `3xx` response.
fn same_scheme_policy(max_redirects: usize) -> Policy {
    Policy::custom(move |attempt| {
        let hops = attempt.previous().len();
        let same_scheme = attempt
            .previous()
            .last()
            .map_or(true, |from| from.scheme() == attempt.url().scheme());

        if hops > max_redirects {
            attempt.error(format!("too many redirects (limit {})", max_redirects))
        } else if same_scheme {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}
