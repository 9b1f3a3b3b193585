//! The honeypot HTTP endpoint.

mod dto;
mod handlers;
mod routes;

pub use dto::{ErrorResponse, HealthResponse, HoneypotRequest, HoneypotResponse, MessageDto};
pub use handlers::HoneypotHandlers;
pub use routes::honeypot_routes;
