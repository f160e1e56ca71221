//! Modern HTTP client.
//!
//! An [`HttpClient`] is configured once through [`HttpClientBuilder`] and then
//! sends immutable [`HttpRequest`] values, either awaiting each exchange with
//! [`send`](HttpClient::send) or starting it on the client's executor with
//! [`send_async`](HttpClient::send_async).
//!
//! ```no_run
//! use http_tour::client::{HttpClient, Redirect};
//! use http_tour::models::{HttpRequest, HttpVersion};
//!
//! # async fn run() -> http_tour::error::HttpResult<()> {
//! let client = HttpClient::builder()
//!     .version(HttpVersion::Http11)
//!     .follow_redirects(Redirect::Always)
//!     .build()?;
//!
//! let request = HttpRequest::new_builder("http://stackoverflow.com").get().build()?;
//! let response = client.send(&request).await?;
//! assert_eq!(response.url, "https://stackoverflow.com/");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod pending;
pub mod proxy;
pub mod redirect;

pub use builder::HttpClientBuilder;
pub use pending::{all_of, PendingResponse};
pub use proxy::ProxySelector;
pub use redirect::Redirect;

use crate::auth::{basic, AuthChallenge, Authenticator, RequestorType};
use crate::config::get_config;
use crate::cookies::CookieManager;
use crate::error::HttpResult;
use crate::models::{HttpRequest, HttpResponse, HttpVersion};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use url::Url;

/// An HTTP client. Cloning is cheap and clones share connections.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    client: reqwest::Client,
    version: HttpVersion,
    redirect: Redirect,
    max_redirects: usize,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    proxy: ProxySelector,
    authenticator: Option<Arc<dyn Authenticator>>,
    cookie_handler: Option<Arc<CookieManager>>,
    executor: Handle,
    default_headers: Vec<(String, String)>,
}

impl HttpClient {
    /// Creates a client from the global configuration.
    pub fn new_client() -> HttpResult<Self> {
        HttpClientBuilder::from_config(&get_config()).build()
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::new()
    }

    pub fn version(&self) -> HttpVersion {
        self.inner.version
    }

    pub fn follow_redirects(&self) -> Redirect {
        self.inner.redirect
    }

    pub fn max_redirects(&self) -> usize {
        self.inner.max_redirects
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.inner.connect_timeout
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.inner.request_timeout
    }

    pub fn proxy(&self) -> &ProxySelector {
        &self.inner.proxy
    }

    pub fn authenticator(&self) -> Option<&Arc<dyn Authenticator>> {
        self.inner.authenticator.as_ref()
    }

    pub fn cookie_handler(&self) -> Option<&Arc<CookieManager>> {
        self.inner.cookie_handler.as_ref()
    }

    pub fn executor(&self) -> &Handle {
        &self.inner.executor
    }

    /// Sends `request` and waits for the whole response.
    ///
    /// Any status code is a successful exchange. A `401` or `407` challenge
    /// is answered once with credentials from the authenticator, if the
    /// client has one, the scheme is Basic, and the request did not already
    /// carry credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be read, the connection fails,
    /// a timeout elapses, or the redirect limit is exceeded.
    pub async fn send(&self, request: &HttpRequest) -> HttpResult<HttpResponse> {
        let response = self.exchange(request, &[]).await?;

        let Some(authenticator) = self.inner.authenticator.as_ref() else {
            return Ok(response);
        };
        let requestor = match response.status_code {
            401 => RequestorType::Server,
            407 => RequestorType::Proxy,
            _ => return Ok(response),
        };
        if request.header(requestor.credentials_header()).is_some() {
            log::debug!(
                "request {} was rejected with its own credentials",
                request.id
            );
            return Ok(response);
        }

        let challenged_url = Url::parse(&response.url).unwrap_or_else(|_| request.url.clone());
        let Some(challenge) = response
            .header(requestor.challenge_header())
            .and_then(|header| AuthChallenge::parse(header, requestor, &challenged_url))
        else {
            return Ok(response);
        };

        if !challenge.is_basic() {
            log::warn!(
                "unsupported authentication scheme \"{}\" for {}",
                challenge.scheme,
                challenged_url
            );
            return Ok(response);
        }

        let Some(credentials) = authenticator.credentials(&challenge) else {
            log::warn!("authenticator declined the challenge for {}", challenged_url);
            return Ok(response);
        };

        log::info!(
            "answering {:?} challenge for {} (realm {:?})",
            requestor,
            challenged_url,
            challenge.realm
        );
        let answer = [(
            requestor.credentials_header().to_string(),
            basic::encode_credentials(&credentials),
        )];
        self.exchange(request, &answer).await
    }

    /// Starts sending `request` on the client's executor.
    pub fn send_async(&self, request: HttpRequest) -> PendingResponse {
        let client = self.clone();
        let request_id = request.id.clone();
        let handle = self
            .inner
            .executor
            .spawn(async move { client.send(&request).await });
        PendingResponse::new(request_id, handle)
    }

    /// Sends all `requests` concurrently. Results keep the input order.
    pub async fn send_all<I>(&self, requests: I) -> Vec<HttpResult<HttpResponse>>
    where
        I: IntoIterator<Item = HttpRequest>,
    {
        let pending = requests
            .into_iter()
            .map(|request| self.send_async(request))
            .collect();
        all_of(pending).await
    }

    async fn exchange(
        &self,
        request: &HttpRequest,
        extra_headers: &[(String, String)],
    ) -> HttpResult<HttpResponse> {
        let inner = &self.inner;
        let mut builder = inner
            .client
            .request(request.method.to_reqwest(), request.url.clone());

        // HTTP/2 is negotiated per connection; only a downgrade is pinned.
        if request.version == Some(HttpVersion::Http11) {
            builder = builder.version(HttpVersion::Http11.to_reqwest());
        }
        if let Some(timeout) = request.timeout.or(inner.request_timeout) {
            builder = builder.timeout(timeout);
        }

        for (name, value) in &inner.default_headers {
            if request.header(name).is_none() {
                builder = builder.header(name.as_str(), value.as_str());
            }
        }
        for (name, value) in request.headers.iter().chain(extra_headers) {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if request.has_body() {
            builder = builder.body(request.body.load().await?);
        }

        log::debug!("{} {} [{}]", request.method, request.url, request.id);
        let started = Instant::now();
        let response = HttpResponse::from_reqwest(builder.send().await?, started).await?;
        log::debug!(
            "{} {} -> {} in {:?}",
            request.method,
            request.url,
            response.status_code,
            response.duration
        );

        Ok(response)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("version", &self.inner.version)
            .field("redirect", &self.inner.redirect)
            .field("max_redirects", &self.inner.max_redirects)
            .field("connect_timeout", &self.inner.connect_timeout)
            .field("proxy", &self.inner.proxy)
            .field("authenticator", &self.inner.authenticator.is_some())
            .field("cookie_handler", &self.inner.cookie_handler.is_some())
            .finish()
    }
}
