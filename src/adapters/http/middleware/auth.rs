//! Static API-key check for the honeypot endpoint.
//!
//! The transport contract is a shared secret in the `x-api-key` header; a
//! missing or wrong key is rejected with 401 before any session state is
//! touched. Comparison is constant-time so the key cannot be probed
//! byte-by-byte.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use secrecy::{ExposeSecret, Secret};
use subtle::ConstantTimeEq;

/// Middleware state - the expected API key.
pub type ApiKeyState = Arc<Secret<String>>;

/// Rejects requests whose `x-api-key` header does not match the configured
/// key.
pub async fn require_api_key(
    State(expected): State<ApiKeyState>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get("x-api-key")
        .and_then(|h| h.to_str().ok());

    match provided {
        Some(key) if keys_match(key, expected.expose_secret()) => next.run(request).await,
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({
                "error": "Invalid API Key",
                "code": "AUTH_ERROR"
            })),
        )
            .into_response(),
    }
}

/// Constant-time key comparison. Only the key length is observable.
fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_keys_are_accepted() {
        assert!(keys_match("secret-123", "secret-123"));
    }

    #[test]
    fn wrong_key_is_rejected() {
        assert!(!keys_match("secret-124", "secret-123"));
    }

    #[test]
    fn different_length_key_is_rejected() {
        assert!(!keys_match("secret", "secret-123"));
        assert!(!keys_match("", "secret-123"));
    }

    #[test]
    fn api_key_state_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ApiKeyState>();
    }
}
