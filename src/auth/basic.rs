//! Basic HTTP authentication (RFC 7617).

use super::PasswordAuthentication;
use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Encodes a username and password into a `Basic` credential header value.
///
/// # Examples
///
/// ```
/// use http_tour::auth::basic::basic_auth;
///
/// assert_eq!(basic_auth("postman", "password"), "Basic cG9zdG1hbjpwYXNzd29yZA==");
/// ```
pub fn basic_auth(username: &str, password: &str) -> String {
    let encoded = STANDARD.encode(format!("{}:{}", username, password).as_bytes());
    format!("Basic {}", encoded)
}

/// Encodes credentials returned by an authenticator.
pub fn encode_credentials(credentials: &PasswordAuthentication) -> String {
    basic_auth(&credentials.username, &credentials.password)
}

/// Decodes a `Basic` credential header value.
///
/// Returns `None` if the scheme is not `Basic`, the payload is not valid
/// base64 or UTF-8, or there is no colon separating user and password.
pub fn parse_basic_auth_header(header: &str) -> Option<PasswordAuthentication> {
    let encoded = header.trim().strip_prefix("Basic ")?.trim();
    let decoded = String::from_utf8(STANDARD.decode(encoded).ok()?).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some(PasswordAuthentication::new(username, password))
}
