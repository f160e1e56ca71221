//! Integration tests module.
//!
//! This module provides common utilities and test infrastructure for
//! exercising both client APIs against local mock servers.

pub mod echo_endpoint_test;
pub mod modern_client_test;

use http_tour::client::{HttpClient, HttpClientBuilder, ProxySelector};
use http_tour::config::update_config;
use std::path::PathBuf;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test environment (run once)
///
/// Mock servers listen on localhost, so environment proxies are switched off
/// for every connection opened from the global configuration.
pub fn init_test_env() {
    INIT.call_once(|| {
        http_tour::init_logging();
        update_config(|config| config.proxy = ProxySelector::NoProxy);
    });
}

/// Client builder that talks to local mock servers directly.
pub fn local_client() -> HttpClientBuilder {
    init_test_env();
    HttpClient::builder().proxy(ProxySelector::NoProxy)
}

/// Path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}
