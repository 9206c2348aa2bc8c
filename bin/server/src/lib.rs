//! coffeebot webhook server.
//!
//! This crate exposes the HTTP endpoint the chat channel posts activities
//! to, wired to the conversation router and the HTTP connector client.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::AppState;
