//! Request gate: method, shared-secret and payload checks that run before
//! any store access.
//!
//! Framework-free so the axum route and the serverless function shim make
//! identical decisions. Checks run in a fixed order and stop at the first
//! failure:
//!
//! 1. `OPTIONS` is a preflight and succeeds with no body.
//! 2. Anything other than `POST` is rejected.
//! 3. If a secret is configured, `x-editor-secret` must match it.
//! 4. The body must be JSON matching the expected shape.

use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Header carrying the shared editor secret.
pub const SECRET_HEADER: &str = "x-editor-secret";

/// Error text returned for a missing or wrong secret.
pub const INVALID_SECRET_MESSAGE: &str = "Invalid editor secret";

/// Transport-neutral view of an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct GateRequest<'a> {
    pub method: &'a str,
    pub secret_header: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// Result of a request that passed the gate.
#[derive(Debug, PartialEq)]
pub enum Admission<T> {
    /// CORS preflight: answer 200 with an empty body, do nothing else.
    Preflight,
    /// Authorized request with a parsed payload.
    Proceed(T),
}

/// Run the gate for a request whose body should parse as `T`.
///
/// `editor_secret` of `None` leaves the gate open.
pub fn admit<T: DeserializeOwned>(
    request: &GateRequest<'_>,
    editor_secret: Option<&str>,
) -> Result<Admission<T>, CoreError> {
    if request.method.eq_ignore_ascii_case("OPTIONS") {
        return Ok(Admission::Preflight);
    }
    if !request.method.eq_ignore_ascii_case("POST") {
        return Err(CoreError::MethodNotAllowed);
    }

    if let Some(expected) = editor_secret {
        let authorized = request
            .secret_header
            .is_some_and(|provided| secrets_match(provided, expected));
        if !authorized {
            return Err(CoreError::Unauthorized(INVALID_SECRET_MESSAGE.into()));
        }
    }

    if let Some(content_type) = request.content_type {
        if !is_json_content_type(content_type) {
            return Err(CoreError::Validation(format!(
                "Expected Content-Type: application/json, got '{content_type}'"
            )));
        }
    }

    let body = if request.body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        request.body
    };

    let payload = serde_json::from_slice(body)
        .map_err(|e| CoreError::Validation(format!("Invalid request body: {e}")))?;
    Ok(Admission::Proceed(payload))
}

fn is_json_content_type(value: &str) -> bool {
    let mime = value.split(';').next().unwrap_or_default().trim();
    mime.eq_ignore_ascii_case("application/json")
}

/// Compare digests of both values so timing does not depend on where the
/// inputs first differ or on their lengths.
fn secrets_match(provided: &str, expected: &str) -> bool {
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::Value;

    fn request<'a>(method: &'a str, secret: Option<&'a str>, body: &'a [u8]) -> GateRequest<'a> {
        GateRequest {
            method,
            secret_header: secret,
            content_type: Some("application/json"),
            body,
        }
    }

    #[test]
    fn options_is_preflight_even_without_secret() {
        let result = admit::<Value>(&request("OPTIONS", None, b"garbage"), Some("s3cret"));
        assert_matches!(result, Ok(Admission::Preflight));
    }

    #[test]
    fn non_post_methods_are_rejected() {
        for method in ["GET", "PUT", "DELETE", "PATCH"] {
            let result = admit::<Value>(&request(method, None, b"{}"), None);
            assert_matches!(result, Err(CoreError::MethodNotAllowed), "{method}");
        }
    }

    #[test]
    fn missing_secret_is_unauthorized() {
        let result = admit::<Value>(&request("POST", None, b"{}"), Some("s3cret"));
        assert_matches!(result, Err(CoreError::Unauthorized(msg)) if msg == "Invalid editor secret");
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let result = admit::<Value>(&request("POST", Some("s3cre"), b"{}"), Some("s3cret"));
        assert_matches!(result, Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn secret_is_checked_before_body() {
        let result = admit::<Value>(&request("POST", None, b"not json"), Some("s3cret"));
        assert_matches!(result, Err(CoreError::Unauthorized(_)));
    }

    #[test]
    fn matching_secret_proceeds() {
        let result = admit::<Value>(&request("POST", Some("s3cret"), b"{\"a\":1}"), Some("s3cret"));
        assert_matches!(result, Ok(Admission::Proceed(v)) if v["a"] == 1);
    }

    #[test]
    fn open_gate_ignores_header() {
        let result = admit::<Value>(&request("post", Some("anything"), b"{}"), None);
        assert_matches!(result, Ok(Admission::Proceed(_)));
    }

    #[test]
    fn empty_body_parses_as_empty_object() {
        let result = admit::<Value>(&request("POST", None, b"  \n"), None);
        assert_matches!(result, Ok(Admission::Proceed(v)) if v == serde_json::json!({}));
    }

    #[test]
    fn invalid_json_is_validation_error() {
        let result = admit::<Value>(&request("POST", None, b"{"), None);
        assert_matches!(result, Err(CoreError::Validation(msg)) if msg.starts_with("Invalid request body"));
    }

    #[test]
    fn non_json_content_type_is_rejected() {
        let req = GateRequest {
            content_type: Some("text/plain"),
            ..request("POST", None, b"{}")
        };
        assert_matches!(admit::<Value>(&req, None), Err(CoreError::Validation(_)));
    }

    #[test]
    fn json_content_type_with_charset_is_accepted() {
        let req = GateRequest {
            content_type: Some("application/json; charset=utf-8"),
            ..request("POST", None, b"{}")
        };
        assert_matches!(admit::<Value>(&req, None), Ok(Admission::Proceed(_)));
    }

    #[test]
    fn secret_comparison() {
        assert!(secrets_match("abc", "abc"));
        assert!(!secrets_match("abc", "abd"));
        assert!(!secrets_match("", "abc"));
    }
}
