//! InMemory Message Repository 実装
//!
//! Implements the domain `MessageRepository` trait with a `HashMap` of
//! per-room vectors. Nothing survives a restart; use the SQLite repository
//! when durability matters.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Message, MessageId, MessageRepository, NewMessage, RepositoryError, RoomId, Timestamp,
};

#[derive(Debug, Default)]
struct Store {
    /// Last assigned id, shared by all rooms.
    last_id: i64,
    rooms: HashMap<RoomId, Vec<Message>>,
}

/// インメモリ Message Repository 実装
#[derive(Debug, Default)]
pub struct InMemoryMessageRepository {
    store: Mutex<Store>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored messages across all rooms.
    pub async fn count(&self) -> usize {
        let store = self.store.lock().await;
        store.rooms.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let mut store = self.store.lock().await;
        // id assignment and insertion happen under one lock, so each room's
        // vector stays sorted by id
        store.last_id += 1;
        let id = MessageId::new(store.last_id);
        let message = Message::from_draft(message, id, Timestamp::now());
        store
            .rooms
            .entry(message.room_id.clone())
            .or_default()
            .push(message.clone());
        Ok(message)
    }

    async fn list_recent(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let store = self.store.lock().await;
        let messages = store
            .rooms
            .get(room_id)
            .map(|messages| {
                let start = messages.len().saturating_sub(limit);
                messages[start..].to_vec()
            })
            .unwrap_or_default();
        Ok(messages)
    }
}
