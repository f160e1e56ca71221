//! A tour of two HTTP client APIs.
//!
//! This crate exercises the same HTTP exchanges through two styles of API:
//! a legacy, connection-oriented one and a modern, builder-based one.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - **models**: Immutable requests, request bodies and received responses
//! - **client**: The modern client, with redirect, proxy, authentication and
//!   cookie policies, synchronous and asynchronous sends
//! - **connection**: The legacy connection API, configured through setters
//!   and read lazily
//! - **auth**: Challenge parsing, authenticators and Basic credentials
//! - **cookies**: `Set-Cookie` parsing and a policy-driven cookie store
//! - **config**: Process-wide defaults loaded from JSON
//! - **error**: The error type shared by every operation
//!
//! # Usage
//!
//! ```no_run
//! use http_tour::client::HttpClient;
//! use http_tour::models::{HttpRequest, RequestBody};
//!
//! # async fn run() -> http_tour::error::HttpResult<()> {
//! let client = HttpClient::new_client()?;
//! let request = HttpRequest::new_builder("https://postman-echo.com/post")
//!     .header("Content-Type", "text/plain;charset=UTF-8")
//!     .post(RequestBody::of_string("Sample body"))
//!     .build()?;
//!
//! let response = client.send(&request).await?;
//! assert_eq!(response.status_code, 200);
//! # Ok(())
//! # }
//! ```
//!
//! # Logging
//!
//! Diagnostics go through the `log` facade. Call [`init_logging`] (or install
//! any other logger) to see them; `RUST_LOG=http_tour=debug` shows every
//! exchange.

pub mod auth;
pub mod client;
pub mod config;
pub mod connection;
pub mod cookies;
pub mod error;
pub mod models;

pub use client::{HttpClient, HttpClientBuilder, PendingResponse, ProxySelector, Redirect};
pub use connection::HttpConnection;
pub use cookies::{CookieManager, CookiePolicy, HttpCookie};
pub use error::{HttpError, HttpResult};
pub use models::{HttpMethod, HttpRequest, HttpResponse, HttpVersion, RequestBody};

/// Installs an `env_logger` logger filtered by `RUST_LOG`, showing warnings
/// and errors when it is unset.
///
/// Calling it more than once is harmless.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp_millis()
        .try_init();
}
