//! UseCase: 履歴取得処理 (HTTP)

use std::sync::Arc;

use crate::domain::{Message, MessageRepository, RoomAccess, RoomId, UserId};

use super::error::HistoryError;

/// Upper bound applied to the `limit` query parameter by default
pub const DEFAULT_MAX_HISTORY_LIMIT: usize = 200;

/// 履歴取得のユースケース
pub struct FetchHistoryUseCase {
    repository: Arc<dyn MessageRepository>,
    access: Arc<dyn RoomAccess>,
    default_limit: usize,
    max_limit: usize,
}

impl FetchHistoryUseCase {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        access: Arc<dyn RoomAccess>,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        Self {
            repository,
            access,
            default_limit,
            max_limit,
        }
    }

    /// Return up to `limit` newest messages of `room_id`, oldest first.
    ///
    /// A missing limit means the default; anything above the maximum is
    /// clamped to it.
    ///
    /// # Errors
    ///
    /// * `Validation` - malformed room id
    /// * `InvalidLimit` - `limit` is zero
    /// * `NotFound` - `viewer` may not read the room
    /// * `Storage` - the store failed
    pub async fn execute(
        &self,
        viewer: Option<UserId>,
        room_id: &str,
        limit: Option<usize>,
    ) -> Result<(RoomId, Vec<Message>), HistoryError> {
        let room_id = RoomId::new(room_id)?;

        let limit = match limit {
            Some(0) => return Err(HistoryError::InvalidLimit),
            Some(n) => n.min(self.max_limit),
            None => self.default_limit.min(self.max_limit),
        };

        if !self.access.can_view(viewer.as_ref(), &room_id) {
            tracing::debug!(
                "History of room '{}' denied to {:?}",
                room_id,
                viewer.as_ref().map(UserId::as_str)
            );
            return Err(HistoryError::NotFound(room_id.into_string()));
        }

        let messages = self.repository.list_recent(&room_id, limit).await?;
        Ok((room_id, messages))
    }
}
