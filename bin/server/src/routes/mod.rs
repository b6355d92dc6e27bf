//! HTTP and WebSocket handlers, grouped by resource.

pub mod characters;
pub mod chat;
pub mod user;
pub mod ws;
