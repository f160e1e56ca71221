//! Live tests against public echo services.
//!
//! These need network access and are ignored by default. Run them with
//! `cargo test -- --ignored`.

use super::{fixture_path, init_test_env};
use http_tour::auth::StaticAuthenticator;
use http_tour::client::{all_of, HttpClient, ProxySelector, Redirect};
use http_tour::connection::HttpConnection;
use http_tour::cookies::{CookieManager, CookiePolicy};
use http_tour::models::{HttpRequest, HttpVersion, RequestBody};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

const POSTMAN_ECHO: &str = "https://postman-echo.com";
const REQRES_USERS: &str = "https://reqres.in/api/users";

fn live_client() -> http_tour::client::HttpClientBuilder {
    HttpClient::builder().proxy(ProxySelector::System)
}

#[tokio::test]
#[ignore = "needs network access"]
async fn live_post_plain_text() {
    let client = live_client().build().unwrap();
    let request = HttpRequest::new_builder(format!("{}/post", POSTMAN_ECHO))
        .header("Content-Type", "text/plain;charset=UTF-8")
        .post(RequestBody::of_string("Sample body"))
        .build()
        .unwrap();

    assert_eq!(client.send(&request).await.unwrap().status_code, 200);
}

#[tokio::test]
#[ignore = "needs network access"]
async fn live_redirect_to_https() {
    let client = live_client()
        .version(HttpVersion::Http11)
        .follow_redirects(Redirect::Always)
        .build()
        .unwrap();
    let request = HttpRequest::new_builder("http://stackoverflow.com")
        .build()
        .unwrap();

    let response = client.send(&request).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(response.url, "https://stackoverflow.com/");
}

#[tokio::test]
#[ignore = "needs network access"]
async fn live_basic_auth() {
    let client = live_client()
        .authenticator(StaticAuthenticator::new("postman", "password"))
        .build()
        .unwrap();
    let request = HttpRequest::new_builder(format!("{}/basic-auth", POSTMAN_ECHO))
        .build()
        .unwrap();

    assert_eq!(client.send(&request).await.unwrap().status_code, 200);
}

#[tokio::test]
#[ignore = "needs network access"]
async fn live_async_file_posts() {
    let client = live_client()
        .version(HttpVersion::Http11)
        .follow_redirects(Redirect::Normal)
        .connect_timeout(Duration::from_secs(20))
        .build()
        .unwrap();
    let request = HttpRequest::new_builder(format!("{}/post", POSTMAN_ECHO))
        .timeout(Duration::from_secs(120))
        .header("Content-Type", "application/json")
        .post(RequestBody::of_file(fixture_path("file.json")))
        .build()
        .unwrap();

    let pending = (0..3)
        .map(|_| client.send_async(request.clone()))
        .collect();
    for result in all_of(pending).await {
        let body = result.unwrap().body_as_string().unwrap();
        assert!(body.contains("morpheus"));
    }
}

#[test]
#[ignore = "needs network access"]
fn live_three_clients_on_two_workers() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();

    let pending: Vec<_> = (0..3)
        .map(|_| {
            let client = live_client()
                .executor(runtime.handle().clone())
                .build()
                .unwrap();
            let request = HttpRequest::new_builder(format!("{}/get", POSTMAN_ECHO))
                .build()
                .unwrap();
            client.send_async(request)
        })
        .collect();

    for result in runtime.block_on(all_of(pending)) {
        assert_eq!(result.unwrap().status_code, 200);
    }
}

#[tokio::test]
#[ignore = "needs network access"]
async fn live_query_parameters_are_echoed() {
    let client = live_client().build().unwrap();
    let requests = ["key1=value1", "key2=value2"].map(|query| {
        HttpRequest::new_builder(format!("{}/get?{}", POSTMAN_ECHO, query))
            .build()
            .unwrap()
    });

    for (query, result) in ["key1", "key2"].iter().zip(client.send_all(requests).await) {
        assert!(result.unwrap().body_as_string().unwrap().contains(query));
    }
}

#[tokio::test]
#[ignore = "needs network access"]
async fn live_cookie_policies() {
    for (policy, expect_cookies) in [(CookiePolicy::AcceptNone, false), (CookiePolicy::AcceptAll, true)] {
        let cookies = Arc::new(CookieManager::new(policy));
        let client = live_client()
            .cookie_handler(Arc::clone(&cookies))
            .build()
            .unwrap();
        let request = HttpRequest::new_builder(format!("{}/cookies/set?foo=bar", POSTMAN_ECHO))
            .build()
            .unwrap();

        client.send(&request).await.unwrap();
        assert_eq!(!cookies.is_empty(), expect_cookies, "policy {:?}", policy);
    }
}

#[test]
#[ignore = "needs network access"]
fn live_legacy_get_and_post() {
    init_test_env();

    let mut connection = HttpConnection::open_with_proxy(REQRES_USERS, ProxySelector::System).unwrap();
    connection.set_request_property("accept", "application/json").unwrap();
    connection
        .set_request_property("User-agent", "Test legacy HTTP connection")
        .unwrap();
    assert_eq!(connection.response_code().unwrap(), 200);

    let mut connection = HttpConnection::open_with_proxy(REQRES_USERS, ProxySelector::System).unwrap();
    connection.set_request_method("POST").unwrap();
    connection
        .set_request_property("Content-Type", "application/json; utf-8")
        .unwrap();
    connection.set_do_output(true).unwrap();
    connection
        .output_stream()
        .unwrap()
        .write_all(br#"{"name": "morpheus", "job": "leader"}"#)
        .unwrap();
    assert_eq!(connection.response_code().unwrap(), 201);
}
