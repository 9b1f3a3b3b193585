//! HTTP handlers for the honeypot endpoint.
//!
//! The handlers are deliberately thin: decode, delegate to the orchestrator,
//! encode. The orchestrator never fails a turn, so apart from an unusable
//! session id every request answers 200 with a reply for the correspondent.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::SessionOrchestrator;
use crate::domain::foundation::SessionId;

use super::dto::{ErrorResponse, HealthResponse, HoneypotRequest, HoneypotResponse};

/// Handler state.
#[derive(Clone)]
pub struct HoneypotHandlers {
    orchestrator: Arc<SessionOrchestrator>,
}

impl HoneypotHandlers {
    pub fn new(orchestrator: Arc<SessionOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// POST /honeypot - process one inbound message, answer with the bait reply.
pub async fn honeypot(
    State(handlers): State<HoneypotHandlers>,
    Json(req): Json<HoneypotRequest>,
) -> Response {
    let session_id = match SessionId::new(req.session_id) {
        Ok(id) => id,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::bad_request(e.to_string())),
            )
                .into_response()
        }
    };

    let message = req.message.into();
    let history = req
        .conversation_history
        .into_iter()
        .map(Into::into)
        .collect();

    let reply = handlers
        .orchestrator
        .handle_message(session_id, message, history)
        .await;

    (StatusCode::OK, Json(HoneypotResponse::success(reply))).into_response()
}

/// GET /health - liveness probe.
pub async fn health() -> Response {
    (StatusCode::OK, Json(HealthResponse::online())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_answers_200() {
        let response = health().await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
