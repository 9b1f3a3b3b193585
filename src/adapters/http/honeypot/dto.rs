//! HTTP DTOs for the honeypot endpoint.
//!
//! These types decouple the wire format from domain types. Field names
//! follow the transport's camelCase contract.

use serde::{Deserialize, Serialize};

use crate::ports::InboundMessage;

/// One conversation message on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDto {
    pub sender: String,
    pub text: String,
    pub timestamp: i64,
}

impl From<MessageDto> for InboundMessage {
    fn from(dto: MessageDto) -> Self {
        InboundMessage::new(dto.sender, dto.text, dto.timestamp)
    }
}

/// Inbound request: the current message plus bounded prior history.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoneypotRequest {
    pub session_id: String,
    pub message: MessageDto,
    #[serde(default)]
    pub conversation_history: Vec<MessageDto>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Reply returned to the transport for the correspondent.
#[derive(Debug, Clone, Serialize)]
pub struct HoneypotResponse {
    pub status: String,
    pub reply: String,
}

impl HoneypotResponse {
    /// The standard success envelope.
    pub fn success(reply: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            reply: reply.into(),
        }
    }
}

/// Health probe response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    /// The service is up.
    pub fn online() -> Self {
        Self {
            status: "online".to_string(),
        }
    }
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
        }
    }
}
