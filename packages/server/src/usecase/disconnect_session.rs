//! UseCase: セッション切断処理
//!
//! Removes the session from every room it joined and keeps a dormant copy
//! for the recovery window. Always runs to completion; disconnecting is a
//! lifecycle event, not an error.

use std::sync::Arc;

use crate::domain::{DeliveryCursor, DormantSession, RecoveryCache, RoomId, RoomRegistry, Session};

/// セッション切断のユースケース
pub struct DisconnectSessionUseCase {
    registry: Arc<RoomRegistry>,
    recovery: Arc<RecoveryCache>,
}

impl DisconnectSessionUseCase {
    pub fn new(registry: Arc<RoomRegistry>, recovery: Arc<RecoveryCache>) -> Self {
        Self { registry, recovery }
    }

    /// Disconnect `session`. `reason` is only logged.
    ///
    /// `delivered` is how far the connection's writer got in each room; a
    /// resume picks up from there.
    ///
    /// Returns the rooms the session was removed from.
    pub async fn execute(
        &self,
        session: &Session,
        reason: &str,
        delivered: DeliveryCursor,
    ) -> Vec<RoomId> {
        let rooms = self.registry.leave_all(session.id()).await;

        self.recovery
            .stash(
                session.resume_token().clone(),
                DormantSession::new(session.identity().clone(), rooms.clone(), delivered),
            )
            .await;

        tracing::info!(
            "Session '{}' disconnected ({}); left {} room(s), resumable for {}s",
            session.id(),
            reason,
            rooms.len(),
            self.recovery.window().as_secs()
        );

        rooms
    }
}
