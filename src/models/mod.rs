//! Data models for HTTP requests and responses.
//!
//! These are the value types passed to and returned from both client APIs.

pub mod request;
pub mod response;

pub use request::{HttpMethod, HttpRequest, HttpRequestBuilder, HttpVersion, RequestBody};
pub use response::HttpResponse;
