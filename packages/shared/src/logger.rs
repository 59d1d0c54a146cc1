//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// `RUST_LOG` wins when set. Otherwise `default_level` applies to this
/// workspace's crates and to `bin_name`, while third-party crates stay at
/// `warn`.
pub fn setup_logger(bin_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(default_directives(bin_name, default_level))
    });

    // A second call (e.g. from several tests) must not panic.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .try_init();
}

fn default_directives(bin_name: &str, default_level: &str) -> String {
    let bin_target = bin_name.replace('-', "_");
    format!(
        "warn,{bin_target}={default_level},murmur_server={default_level},murmur_shared={default_level},tower_http={default_level}"
    )
}
