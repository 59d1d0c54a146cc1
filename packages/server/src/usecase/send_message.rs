//! UseCase: メッセージ送信処理
//!
//! Validate, persist, then broadcast to the room's current members.
//!
//! Persist-then-publish runs inside the room's critical section, so for any
//! two messages of one room the one with the smaller id is queued to every
//! member first. The section runs on its own task: if the sender's
//! connection is torn down mid-call, the message is still stored and
//! delivered to everyone else.

use std::sync::Arc;

use crate::domain::{
    Identity, Message, MessageRepository, MessageText, NewMessage, OutboundEvent, RoomId,
    RoomRegistry, Session,
};

use super::{error::SendMessageError, sequencer::RoomSequencer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendOutcome {
    pub message: Message,
    /// Members whose outbox accepted the broadcast.
    pub recipients: usize,
}

/// メッセージ送信のユースケース
pub struct SendMessageUseCase {
    repository: Arc<dyn MessageRepository>,
    registry: Arc<RoomRegistry>,
    sequencer: Arc<RoomSequencer>,
}

impl SendMessageUseCase {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<RoomRegistry>,
        sequencer: Arc<RoomSequencer>,
    ) -> Self {
        Self {
            repository,
            registry,
            sequencer,
        }
    }

    /// Send `text` from `session` to `room_id`.
    ///
    /// # Errors
    ///
    /// * `Validation` - empty or too long text; nothing stored or broadcast
    /// * `Storage` - the store failed; nothing stored or broadcast
    pub async fn execute(
        &self,
        session: &Session,
        room_id: RoomId,
        text: &str,
        asserted_author_id: Option<&str>,
    ) -> Result<SendOutcome, SendMessageError> {
        self.send_as(session.identity(), room_id, text, asserted_author_id)
            .await
    }

    /// Send on behalf of `identity` without a live session, as the HTTP
    /// endpoint does. Same rules and errors as [`Self::execute`].
    pub async fn send_as(
        &self,
        identity: &Identity,
        room_id: RoomId,
        text: &str,
        asserted_author_id: Option<&str>,
    ) -> Result<SendOutcome, SendMessageError> {
        let text = MessageText::new(text)?;

        if identity.verified
            && let Some(asserted) = asserted_author_id
            && asserted != identity.id.as_str()
        {
            tracing::debug!(
                "Ignoring asserted author '{}' for verified user '{}'",
                asserted,
                identity.id
            );
        }
        let draft = NewMessage::new(room_id, identity.author(asserted_author_id), text);

        let task = tokio::spawn(persist_and_publish(
            self.repository.clone(),
            self.registry.clone(),
            self.sequencer.clone(),
            draft,
        ));

        task.await
            .map_err(|e| SendMessageError::Storage(format!("send task aborted: {e}")))?
    }
}

async fn persist_and_publish(
    repository: Arc<dyn MessageRepository>,
    registry: Arc<RoomRegistry>,
    sequencer: Arc<RoomSequencer>,
    draft: NewMessage,
) -> Result<SendOutcome, SendMessageError> {
    let _turn = sequencer.acquire(&draft.room_id).await;

    let message = repository.append(draft).await?;

    // 1. Snapshot members after the append completes
    let members = registry.members(&message.room_id).await;

    // 2. Dispatch before releasing the room
    let mut recipients = 0;
    for member in members {
        if member
            .outbox
            .send(OutboundEvent::Message(message.clone()))
            .is_ok()
        {
            recipients += 1;
        } else {
            tracing::debug!(
                "Skipping closed session '{}' in room '{}'",
                member.session_id,
                message.room_id
            );
        }
    }

    tracing::info!(
        "Message {} from '{}' in room '{}' delivered to {} member(s)",
        message.id,
        message.author_id,
        message.room_id,
        recipients
    );

    Ok(SendOutcome {
        message,
        recipients,
    })
}
