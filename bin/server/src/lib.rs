//! TimeTalker HTTP and WebSocket server.
//!
//! Exposes the persona catalog, authenticated text chat, anonymous voice
//! chat, streaming chat over WebSockets, and the per-user conversation
//! store (history, favorites, settings, ratings, preferences).

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod error;
pub mod retention;
pub mod routes;
pub mod state;

pub use app::router;
pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;
