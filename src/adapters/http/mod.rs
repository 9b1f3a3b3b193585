//! HTTP transport adapter.

pub mod honeypot;
pub mod middleware;

use axum::Router;

use crate::adapters::http::honeypot::{honeypot_routes, HoneypotHandlers};
use crate::adapters::http::middleware::ApiKeyState;

/// Builds the full application router: the API-key-protected honeypot
/// endpoint plus the open health probe.
pub fn router(handlers: HoneypotHandlers, api_key: ApiKeyState) -> Router {
    honeypot_routes(handlers, api_key)
}
