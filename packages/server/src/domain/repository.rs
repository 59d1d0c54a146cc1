//! Message store abstraction.
//!
//! The usecase layer depends on this trait only; implementations live in
//! `infrastructure::repository`.

use async_trait::async_trait;

use super::{Message, NewMessage, RepositoryError, RoomId};

/// Durable, append-only record of messages per room.
///
/// Implementations must be safe for concurrent use.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a validated message and return it with its assigned id and
    /// timestamp.
    ///
    /// Either the message is durably recorded or `Err` is returned and
    /// nothing was written.
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError>;

    /// The `limit` most recent messages of a room, oldest first, ordered by
    /// message id.
    async fn list_recent(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError>;
}
