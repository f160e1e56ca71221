//! Builder for [`HttpClient`].

use super::{HttpClient, HttpClientInner, ProxySelector, Redirect};
use crate::auth::Authenticator;
use crate::config::{ClientConfig, DEFAULT_USER_AGENT};
use crate::cookies::CookieManager;
use crate::error::{HttpError, HttpResult};
use crate::models::request::validate_header;
use crate::models::HttpVersion;
use once_cell::sync::OnceCell;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};

/// Runtime used by clients built outside any tokio runtime.
static DEFAULT_RUNTIME: OnceCell<Runtime> = OnceCell::new();

fn default_executor() -> HttpResult<Handle> {
    if let Ok(handle) = Handle::try_current() {
        return Ok(handle);
    }

    let runtime = DEFAULT_RUNTIME.get_or_try_init(|| {
        log::debug!("starting default client runtime");
        tokio::runtime::Builder::new_multi_thread()
            .thread_name("http-tour-worker")
            .enable_all()
            .build()
    })?;
    Ok(runtime.handle().clone())
}

/// Configures and creates an [`HttpClient`].
///
/// Starts from built-in defaults: HTTP/2 preferred, redirects never
/// followed, system proxies, no connect timeout, no authenticator and no
/// cookie handler. [`from_config`](Self::from_config) starts from a
/// [`ClientConfig`] instead.
#[derive(Clone)]
pub struct HttpClientBuilder {
    version: HttpVersion,
    redirect: Redirect,
    max_redirects: usize,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    proxy: ProxySelector,
    authenticator: Option<Arc<dyn Authenticator>>,
    cookie_handler: Option<Arc<CookieManager>>,
    executor: Option<Handle>,
    user_agent: String,
    default_headers: Vec<(String, String)>,
    accept_invalid_certs: bool,
}

impl HttpClientBuilder {
    pub fn new() -> Self {
        Self {
            version: HttpVersion::Http2,
            redirect: Redirect::Never,
            max_redirects: 5,
            connect_timeout: None,
            request_timeout: None,
            proxy: ProxySelector::System,
            authenticator: None,
            cookie_handler: None,
            executor: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            default_headers: Vec::new(),
            accept_invalid_certs: false,
        }
    }

    /// Starts from `config`. A configured cookie policy installs a fresh
    /// [`CookieManager`] with that policy.
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut default_headers: Vec<(String, String)> = config
            .default_headers
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        default_headers.sort();

        Self {
            version: config.http_version,
            redirect: config.follow_redirects,
            max_redirects: config.max_redirects,
            connect_timeout: config.connect_timeout_duration(),
            request_timeout: Some(config.request_timeout_duration()),
            proxy: config.proxy.clone(),
            authenticator: None,
            cookie_handler: config
                .cookie_policy
                .map(|policy| Arc::new(CookieManager::new(policy))),
            executor: None,
            user_agent: config.user_agent.clone(),
            default_headers,
            accept_invalid_certs: !config.validate_ssl,
        }
    }

    /// Preferred protocol version. `Http11` never negotiates HTTP/2.
    pub fn version(mut self, version: HttpVersion) -> Self {
        self.version = version;
        self
    }

    pub fn follow_redirects(mut self, redirect: Redirect) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Timeout for requests that do not set their own.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn proxy(mut self, proxy: ProxySelector) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn authenticator<A: Authenticator + 'static>(mut self, authenticator: A) -> Self {
        self.authenticator = Some(Arc::new(authenticator));
        self
    }

    /// Stores cookies from responses in `cookies` and sends matching ones
    /// back. The manager may be shared with other clients.
    pub fn cookie_handler(mut self, cookies: Arc<CookieManager>) -> Self {
        self.cookie_handler = Some(cookies);
        self
    }

    /// Runtime that [`HttpClient::send_async`] spawns exchanges on.
    pub fn executor(mut self, executor: Handle) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Header sent with every request that does not carry it already.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Skips TLS certificate validation.
    ///
    /// **Warning:** only for test servers with self-signed certificates.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Creates the client.
    ///
    /// Without an explicit executor, the client spawns on the runtime it was
    /// built in, or on a shared background runtime when built outside one.
    pub fn build(self) -> HttpResult<HttpClient> {
        if self.redirect != Redirect::Never && self.max_redirects == 0 {
            return Err(HttpError::Config(
                "max_redirects must be greater than zero when following redirects".to_string(),
            ));
        }
        if matches!(self.request_timeout, Some(timeout) if timeout.is_zero()) {
            return Err(HttpError::Config(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        for (name, value) in &self.default_headers {
            validate_header(name, value)?;
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .redirect(self.redirect.to_policy(self.max_redirects))
            .danger_accept_invalid_certs(self.accept_invalid_certs);

        if let Some(timeout) = self.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if self.version == HttpVersion::Http11 {
            builder = builder.http1_only();
        }
        if let Some(cookies) = &self.cookie_handler {
            builder = builder.cookie_provider(Arc::clone(cookies));
        }
        builder = self.proxy.apply(builder)?;

        let executor = match self.executor {
            Some(handle) => handle,
            None => default_executor()?,
        };

        log::debug!(
            "client built: version={:?} redirect={:?} proxy={:?}",
            self.version,
            self.redirect,
            self.proxy
        );

        Ok(HttpClient {
            inner: Arc::new(HttpClientInner {
                client: builder.build()?,
                version: self.version,
                redirect: self.redirect,
                max_redirects: self.max_redirects,
                connect_timeout: self.connect_timeout,
                request_timeout: self.request_timeout,
                proxy: self.proxy,
                authenticator: self.authenticator,
                cookie_handler: self.cookie_handler,
                executor,
                default_headers: self.default_headers,
            }),
        })
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HttpClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientBuilder")
            .field("version", &self.version)
            .field("redirect", &self.redirect)
            .field("max_redirects", &self.max_redirects)
            .field("connect_timeout", &self.connect_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("proxy", &self.proxy)
            .field("authenticator", &self.authenticator.is_some())
            .field("cookie_handler", &self.cookie_handler.is_some())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}
