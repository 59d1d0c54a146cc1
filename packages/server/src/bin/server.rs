//! Murmur chat relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin murmur-server -- --port 3000 --database-url sqlite://murmur.db
//! ```

use clap::Parser;
use murmur_server::config::{Cli, ServerConfig};
use murmur_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &cli.log_level);

    let config = ServerConfig::from(cli);
    tracing::debug!("Starting with {:?}", config);

    // Run the server
    if let Err(e) = murmur_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
