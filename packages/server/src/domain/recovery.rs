//! Reconnection recovery window.
//!
//! Maps a resume token to the dormant state of a disconnected session.
//! Entries expire after a fixed window; expiry is checked lazily on access,
//! and stale entries are pruned whenever a new one is stashed.

use std::{collections::HashMap, time::Duration};

use tokio::{sync::Mutex, time::Instant};

use super::{DormantSession, ResumeToken};

/// Default recovery window: 2 minutes.
pub const DEFAULT_RECOVERY_WINDOW: Duration = Duration::from_secs(120);

#[derive(Debug)]
struct Entry {
    dormant: DormantSession,
    expires_at: Instant,
}

#[derive(Debug)]
pub struct RecoveryCache {
    window: Duration,
    entries: Mutex<HashMap<ResumeToken, Entry>>,
}

impl RecoveryCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Keep `dormant` resumable under `token` until the window elapses.
    pub async fn stash(&self, token: ResumeToken, dormant: DormantSession) {
        self.stash_at(token, dormant, Instant::now()).await;
    }

    /// Consume the entry for `token` if it has not expired.
    pub async fn take(&self, token: &ResumeToken) -> Option<DormantSession> {
        self.take_at(token, Instant::now()).await
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn stash_at(&self, token: ResumeToken, dormant: DormantSession, now: Instant) {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            token,
            Entry {
                dormant,
                expires_at: now + self.window,
            },
        );
    }

    async fn take_at(&self, token: &ResumeToken, now: Instant) -> Option<DormantSession> {
        let entry = self.entries.lock().await.remove(token)?;
        (entry.expires_at > now).then_some(entry.dormant)
    }
}

impl Default for RecoveryCache {
    fn default() -> Self {
        Self::new(DEFAULT_RECOVERY_WINDOW)
    }
}
