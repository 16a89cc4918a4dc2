//! HTTP and WebSocket request handlers.

pub mod health;
pub mod sessions;
pub mod ws;
