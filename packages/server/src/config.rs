//! Command line and runtime configuration.

use std::time::Duration;

use axum::http::HeaderValue;
use clap::Parser;

use crate::{
    domain::recovery::DEFAULT_RECOVERY_WINDOW,
    usecase::{DEFAULT_HISTORY_LIMIT, DEFAULT_MAX_HISTORY_LIMIT, DEFAULT_STATS_INTERVAL},
};

#[derive(Debug, Parser)]
#[command(
    name = "murmur-server",
    version,
    about = "Room-based chat relay over WebSocket"
)]
pub struct Cli {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind
    #[arg(long, default_value_t = 3000)]
    pub port: u16,

    /// SQLite URL for the message store, e.g. `sqlite://murmur.db`.
    /// Messages are kept in memory when omitted.
    #[arg(long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Messages replayed to a session when it joins a room
    #[arg(long, default_value_t = DEFAULT_HISTORY_LIMIT)]
    pub history_limit: usize,

    /// Upper bound for `limit` on the HTTP history endpoint
    #[arg(long, default_value_t = DEFAULT_MAX_HISTORY_LIMIT)]
    pub max_history_limit: usize,

    /// Seconds between stats log lines (0 disables)
    #[arg(long, default_value_t = DEFAULT_STATS_INTERVAL.as_secs())]
    pub stats_interval_secs: u64,

    /// Seconds a disconnected session can be resumed
    #[arg(long, default_value_t = DEFAULT_RECOVERY_WINDOW.as_secs())]
    pub recovery_window_secs: u64,

    /// Replay the full room history to resumed sessions instead of only
    /// what they missed
    #[arg(long)]
    pub replay_history_on_resume: bool,

    /// Origin allowed by CORS. Any origin is allowed when omitted.
    #[arg(long, env = "FRONTEND_URL", value_name = "ORIGIN", value_parser = parse_origin)]
    pub frontend_url: Option<HeaderValue>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// Settings the server runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    pub history_limit: usize,
    pub max_history_limit: usize,
    pub stats_interval: Duration,
    pub recovery_window: Duration,
    pub replay_history_on_resume: bool,
    /// CORS origin; `None` allows any.
    pub frontend_url: Option<HeaderValue>,
}

fn parse_origin(raw: &str) -> Result<HeaderValue, String> {
    let origin = raw.trim().trim_end_matches('/');
    if origin.is_empty() {
        return Err("origin cannot be empty".to_string());
    }
    HeaderValue::from_str(origin).map_err(|e| e.to_string())
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: None,
            history_limit: DEFAULT_HISTORY_LIMIT,
            max_history_limit: DEFAULT_MAX_HISTORY_LIMIT,
            stats_interval: DEFAULT_STATS_INTERVAL,
            recovery_window: DEFAULT_RECOVERY_WINDOW,
            replay_history_on_resume: false,
            frontend_url: None,
        }
    }
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            host: cli.host,
            port: cli.port,
            database_url: cli.database_url,
            history_limit: cli.history_limit,
            max_history_limit: cli.max_history_limit,
            stats_interval: Duration::from_secs(cli.stats_interval_secs),
            recovery_window: Duration::from_secs(cli.recovery_window_secs),
            replay_history_on_resume: cli.replay_history_on_resume,
            frontend_url: cli.frontend_url,
        }
    }
}
