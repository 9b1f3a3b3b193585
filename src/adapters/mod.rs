//! Adapters - concrete implementations of the ports plus the HTTP surface.

pub mod http;
pub mod reply;
pub mod report;
pub mod store;
