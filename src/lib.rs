//! Baitline - Conversational Scam Decoy Service
//!
//! This crate implements a honeypot endpoint that keeps scam operators
//! talking, extracts identifying and financial artifacts from their
//! messages, and reports a structured intelligence summary to a downstream
//! collector exactly once per conversation.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
