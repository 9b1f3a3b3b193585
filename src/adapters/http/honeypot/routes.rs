//! HTTP routes for the honeypot endpoints.

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::adapters::http::middleware::{require_api_key, ApiKeyState};

use super::handlers::{health, honeypot, HoneypotHandlers};

/// Creates the honeypot router.
///
/// The API-key layer guards only `/honeypot`; the health probe stays open
/// for load balancers.
pub fn honeypot_routes(handlers: HoneypotHandlers, api_key: ApiKeyState) -> Router {
    Router::new()
        .route("/honeypot", post(honeypot))
        .layer(middleware::from_fn_with_state(api_key, require_api_key))
        .route("/health", get(health))
        .with_state(handlers)
}
