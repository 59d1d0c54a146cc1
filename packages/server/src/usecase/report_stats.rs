//! UseCase: 接続状況の定期レポート
//!
//! Logs live session and room counts on a fixed interval. Read-only, and it
//! never waits on the registry: a busy registry just skips the tick.

use std::{sync::Arc, time::Duration};

use tokio::{
    task::JoinHandle,
    time::{Instant, MissedTickBehavior, interval_at},
};

use crate::domain::{RegistryStats, RoomRegistry};

/// Default reporting interval
pub const DEFAULT_STATS_INTERVAL: Duration = Duration::from_secs(60);

pub struct StatsReporter {
    registry: Arc<RoomRegistry>,
    interval: Duration,
}

impl StatsReporter {
    pub fn new(registry: Arc<RoomRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Start the background task. A zero interval disables reporting.
    pub fn spawn(self) -> Option<JoinHandle<()>> {
        if self.interval.is_zero() {
            tracing::info!("Stats reporting disabled");
            return None;
        }

        Some(tokio::spawn(async move {
            // First report one full period after startup
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                self.report_once();
            }
        }))
    }

    /// Log one snapshot. Returns `None` when the tick was skipped.
    pub fn report_once(&self) -> Option<RegistryStats> {
        match self.registry.try_stats() {
            Some(stats) => {
                tracing::info!(
                    sessions = stats.sessions,
                    rooms = stats.rooms,
                    "Relay stats: {} session(s) in {} active room(s)",
                    stats.sessions,
                    stats.rooms
                );
                Some(stats)
            }
            None => {
                tracing::debug!("Registry busy, skipping stats tick");
                None
            }
        }
    }
}
