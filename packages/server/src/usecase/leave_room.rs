//! UseCase: ルーム退出処理

use std::sync::Arc;

use crate::domain::{RoomId, RoomRegistry, Session};

/// ルーム退出のユースケース
pub struct LeaveRoomUseCase {
    registry: Arc<RoomRegistry>,
}

impl LeaveRoomUseCase {
    pub fn new(registry: Arc<RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Leave a single room. Returns `false` if the session was not a member.
    pub async fn execute(&self, session: &Session, room_id: &RoomId) -> bool {
        let left = self.registry.leave(room_id, session.id()).await;
        if left {
            tracing::info!("Session '{}' left room '{}'", session.id(), room_id);
        } else {
            tracing::debug!(
                "Session '{}' asked to leave room '{}' it was not in",
                session.id(),
                room_id
            );
        }
        left
    }
}
