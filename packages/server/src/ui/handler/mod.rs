//! Handler modules for HTTP and WebSocket endpoints.

pub mod http;
pub mod websocket;

// Re-export HTTP handlers
pub use http::{VIEWER_HEADER, health_check, post_message, room_history, stats};

// Re-export WebSocket handlers
pub use websocket::websocket_handler;
