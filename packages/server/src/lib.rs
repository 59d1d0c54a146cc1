//! Murmur chat relay.
//!
//! Sessions connect over WebSocket, join named rooms, and exchange messages
//! that are persisted before being broadcast to every current member.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use ui::{AppState, build_router, run as run_server};
