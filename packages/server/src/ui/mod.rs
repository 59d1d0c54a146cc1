//! WebSocket and HTTP surface of the relay.

mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{build_router, run};
pub use state::AppState;
