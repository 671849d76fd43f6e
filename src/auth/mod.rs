//! Admin key guard for moderation routes.
//!
//! Implements constant-time comparison to mitigate timing attacks.

use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

use crate::errors::AppError;

/// Header name for the admin key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Admin key layer function that takes the expected key as a parameter.
pub async fn admin_key_layer(expected_key: Option<String>, request: Request, next: Next) -> Response {
    // No key configured: moderation routes are open (dev mode)
    let Some(expected) = expected_key else {
        return next.run(request).await;
    };

    let matches = provided_key(&request).map(|provided| constant_time_compare(provided, &expected));
    match matches {
        Some(true) => next.run(request).await,
        Some(false) => AppError::Unauthorized("Invalid API key".to_string()).into_response(),
        None => AppError::Unauthorized("Missing API key".to_string()).into_response(),
    }
}

/// Key from `x-api-key`, falling back to an `Authorization: Bearer` token.
fn provided_key(request: &Request) -> Option<&str> {
    let headers = request.headers();
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn test_constant_time_compare_equal() {
        assert!(constant_time_compare("test-key-123", "test-key-123"));
    }

    #[test]
    fn test_constant_time_compare_not_equal() {
        assert!(!constant_time_compare("test-key-123", "test-key-124"));
    }

    #[test]
    fn test_constant_time_compare_different_lengths() {
        assert!(!constant_time_compare("short", "much-longer-key"));
    }

    #[test]
    fn test_constant_time_compare_empty() {
        assert!(constant_time_compare("", ""));
        assert!(!constant_time_compare("", "not-empty"));
    }

    #[test]
    fn test_provided_key_sources() {
        let request = Request::builder()
            .header(API_KEY_HEADER, "from-header")
            .header(header::AUTHORIZATION, "Bearer from-bearer")
            .body(Body::empty())
            .unwrap();
        assert_eq!(provided_key(&request), Some("from-header"));

        let request = Request::builder()
            .header(header::AUTHORIZATION, "Bearer from-bearer")
            .body(Body::empty())
            .unwrap();
        assert_eq!(provided_key(&request), Some("from-bearer"));

        let request = Request::builder()
            .header(header::AUTHORIZATION, "Basic abc")
            .body(Body::empty())
            .unwrap();
        assert_eq!(provided_key(&request), None);
    }
}
