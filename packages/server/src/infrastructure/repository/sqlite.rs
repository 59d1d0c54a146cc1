//! SQLite Message Repository 実装
//!
//! Durable message store backed by sqlx. Message ids come from an
//! `AUTOINCREMENT` primary key, so they are strictly increasing and never
//! reused; history is ordered by that key.

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::domain::{
    Message, MessageId, MessageRepository, MessageText, NewMessage, RepositoryError, RoomId,
    Timestamp, UserId,
};

const CREATE_MESSAGES_TABLE: &str = "CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    author_name TEXT NOT NULL,
    text TEXT NOT NULL,
    created_at INTEGER NOT NULL
)";

const CREATE_ROOM_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_room_id ON messages (room_id, id)";

type MessageRow = (i64, String, String, String, i64);

fn storage_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Storage(err.to_string())
}

pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    /// Open (creating if needed) the database at `url` and ensure the schema.
    ///
    /// In-memory URLs get a single connection that is never recycled, since
    /// every SQLite in-memory connection is its own database.
    pub async fn connect(url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(storage_error)?
            .create_if_missing(true);

        let pool_options = if url.contains(":memory:") || url.contains("mode=memory") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(storage_error)?;
        Self::from_pool(pool).await
    }

    /// Wrap an existing pool and ensure the schema.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, RepositoryError> {
        let repository = Self { pool };
        repository.migrate().await?;
        Ok(repository)
    }

    async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_MESSAGES_TABLE)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        sqlx::query(CREATE_ROOM_INDEX)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        tracing::debug!("messages schema is up to date");
        Ok(())
    }

    fn row_to_message(room_id: &RoomId, row: MessageRow) -> Result<Message, RepositoryError> {
        let (id, author_id, author_name, text, created_at) = row;
        let corrupt = |e| RepositoryError::Storage(format!("corrupt message row {id}: {e}"));
        Ok(Message {
            id: MessageId::new(id),
            room_id: room_id.clone(),
            author_id: UserId::new(author_id).map_err(corrupt)?,
            author_name,
            text: MessageText::new(&text).map_err(corrupt)?,
            created_at: Timestamp::new(created_at),
        })
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<Message, RepositoryError> {
        let created_at = Timestamp::now();
        let result = sqlx::query(
            "INSERT INTO messages (room_id, author_id, author_name, text, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(message.room_id.as_str())
        .bind(message.author.id.as_str())
        .bind(message.author.name.as_str())
        .bind(message.text.as_str())
        .bind(created_at.value())
        .execute(&self.pool)
        .await
        .map_err(storage_error)?;

        let id = MessageId::new(result.last_insert_rowid());
        Ok(Message::from_draft(message, id, created_at))
    }

    async fn list_recent(
        &self,
        room_id: &RoomId,
        limit: usize,
    ) -> Result<Vec<Message>, RepositoryError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let mut rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, author_id, author_name, text, created_at
             FROM messages
             WHERE room_id = ?
             ORDER BY id DESC
             LIMIT ?",
        )
        .bind(room_id.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(storage_error)?;

        rows.reverse();
        rows.into_iter()
            .map(|row| Self::row_to_message(room_id, row))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Identity;

    async fn create_test_repository() -> SqliteMessageRepository {
        SqliteMessageRepository::connect("sqlite::memory:")
            .await
            .expect("Failed to open in-memory SQLite")
    }

    fn draft(room: &str, author: &str, text: &str) -> NewMessage {
        NewMessage::new(
            RoomId::new(room).unwrap(),
            Identity::verified(UserId::new(author).unwrap(), Some(author.to_uppercase()))
                .author(None),
            MessageText::new(text).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_append_persists_and_returns_message() {
        // given:
        let repo = create_test_repository().await;

        // when:
        let message = repo.append(draft("global", "alice", "  hello ")).await.unwrap();

        // then:
        assert_eq!(message.text.as_str(), "hello");
        assert_eq!(message.author_id.as_str(), "alice");
        assert_eq!(message.author_name, "ALICE");

        let stored = repo
            .list_recent(&RoomId::new("global").unwrap(), 10)
            .await
            .unwrap();
        assert_eq!(stored, vec![message]);
    }

    #[tokio::test]
    async fn test_list_recent_orders_by_id_and_limits() {
        // given:
        let repo = create_test_repository().await;
        let mut ids = Vec::new();
        for i in 0..60 {
            let m = repo
                .append(draft("global", "alice", &format!("m{i}")))
                .await
                .unwrap();
            ids.push(m.id);
        }
        repo.append(draft("elsewhere", "bob", "noise")).await.unwrap();

        // when:
        let recent = repo
            .list_recent(&RoomId::new("global").unwrap(), 50)
            .await
            .unwrap();

        // then: the newest 50 of this room, oldest first
        assert_eq!(recent.len(), 50);
        assert_eq!(recent.first().unwrap().text.as_str(), "m10");
        assert_eq!(recent.last().unwrap().text.as_str(), "m59");
        let recent_ids: Vec<MessageId> = recent.iter().map(|m| m.id).collect();
        assert_eq!(recent_ids, ids[10..].to_vec());
    }

    #[tokio::test]
    async fn test_messages_survive_reconnect() {
        // given: a file-backed database
        let path = std::env::temp_dir().join(format!("murmur-{}.db", uuid::Uuid::new_v4()));
        let url = format!("sqlite://{}", path.display());
        let written = {
            let repo = SqliteMessageRepository::connect(&url).await.unwrap();
            repo.append(draft("global", "alice", "still here"))
                .await
                .unwrap()
        };

        // when:
        let reopened = SqliteMessageRepository::connect(&url).await.unwrap();
        let recent = reopened
            .list_recent(&RoomId::new("global").unwrap(), 50)
            .await
            .unwrap();

        // then:
        assert_eq!(recent, vec![written]);

        reopened.pool.close().await;
        let _ = std::fs::remove_file(&path);
    }
}
