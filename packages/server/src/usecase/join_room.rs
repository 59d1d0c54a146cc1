//! UseCase: ルーム参加処理
//!
//! Registers a session in a room and replays recent history to that session
//! only. Both happen inside the room's critical section, so every message is
//! seen exactly once: either in the replayed history or as a later
//! broadcast.
//!
//! A history failure does not undo the join; the session keeps receiving
//! new messages and gets a scoped error instead of the replay.

use std::sync::Arc;

use crate::domain::{
    Message, MessageId, MessageRepository, OutboundEvent, RoomId, RoomRegistry, Session,
};

use super::sequencer::RoomSequencer;

/// Default number of messages replayed on join
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// What happened to the history replay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryReplay {
    /// This many messages were queued for the joiner.
    Delivered(usize),
    /// The store failed; an error was queued instead.
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// `false` when the session was already a member.
    pub newly_joined: bool,
    pub history: HistoryReplay,
}

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn MessageRepository>,
    registry: Arc<RoomRegistry>,
    sequencer: Arc<RoomSequencer>,
    history_limit: usize,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn MessageRepository>,
        registry: Arc<RoomRegistry>,
        sequencer: Arc<RoomSequencer>,
        history_limit: usize,
    ) -> Self {
        Self {
            repository,
            registry,
            sequencer,
            history_limit,
        }
    }

    /// Join `room_id` and replay its history to `session`.
    pub async fn execute(&self, session: &Session, room_id: RoomId) -> JoinOutcome {
        let _turn = self.sequencer.acquire(&room_id).await;

        let newly_joined = self.registry.join(&room_id, session).await;
        let history = self.replay(session, &room_id, None, true).await;

        tracing::info!(
            "Session '{}' joined room '{}' (new: {}, history: {:?})",
            session.id(),
            room_id,
            newly_joined,
            history
        );

        JoinOutcome {
            newly_joined,
            history,
        }
    }

    /// Restore a membership of a resumed session.
    ///
    /// Only messages newer than `last_delivered` are replayed, and nothing is
    /// sent when there are none. Runs in the room's critical section, so no
    /// message falls between the replay and the live broadcasts.
    pub async fn resume(
        &self,
        session: &Session,
        room_id: RoomId,
        last_delivered: Option<MessageId>,
    ) -> HistoryReplay {
        let _turn = self.sequencer.acquire(&room_id).await;

        self.registry.join(&room_id, session).await;
        let history = self.replay(session, &room_id, last_delivered, false).await;

        tracing::info!(
            "Session '{}' rejoined room '{}' after resume (missed: {:?})",
            session.id(),
            room_id,
            history
        );

        history
    }

    /// Join without any replay. Used for channel subscriptions.
    pub async fn subscribe(&self, session: &Session, room_id: &RoomId) -> bool {
        let _turn = self.sequencer.acquire(room_id).await;

        let newly_joined = self.registry.join(room_id, session).await;
        tracing::info!(
            "Session '{}' subscribed to '{}' (new: {})",
            session.id(),
            room_id,
            newly_joined
        );
        newly_joined
    }

    async fn replay(
        &self,
        session: &Session,
        room_id: &RoomId,
        after: Option<MessageId>,
        send_empty: bool,
    ) -> HistoryReplay {
        match self
            .repository
            .list_recent(room_id, self.history_limit)
            .await
        {
            Ok(messages) => {
                let messages: Vec<Message> = messages
                    .into_iter()
                    .filter(|m| after.is_none_or(|last| m.id > last))
                    .collect();
                let count = messages.len();
                if count > 0 || send_empty {
                    session.notify(OutboundEvent::History {
                        room_id: room_id.clone(),
                        messages,
                    });
                }
                HistoryReplay::Delivered(count)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to load history of room '{}' for session '{}': {}",
                    room_id,
                    session.id(),
                    e
                );
                session.notify_error(format!("history for room '{room_id}' is unavailable"));
                HistoryReplay::Unavailable
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            Identity, MessageText, MockMessageRepository, NewMessage, RepositoryError,
            ResumeToken, SessionId, UserId,
        },
        infrastructure::repository::InMemoryMessageRepository,
    };
    use tokio::sync::mpsc::{self, UnboundedReceiver};

    fn session(id: &str) -> (Session, UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session::new(
            SessionId::new(id),
            Identity::verified(UserId::new(id).unwrap(), None),
            ResumeToken::new(format!("token-{id}")),
            tx,
        );
        (session, rx)
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id).unwrap()
    }

    async fn seed(repo: &InMemoryMessageRepository, room_id: &str, count: usize) {
        for i in 0..count {
            repo.append(NewMessage::new(
                room(room_id),
                Identity::verified(UserId::new("seed").unwrap(), None).author(None),
                MessageText::new(&format!("{room_id}-{i}")).unwrap(),
            ))
            .await
            .unwrap();
        }
    }

    #[tokio::test]
    async fn test_join_replays_latest_history_oldest_first() {
        // given: 60 messages in "global", some noise in "other"
        let repo = Arc::new(InMemoryMessageRepository::new());
        seed(&repo, "global", 60).await;
        seed(&repo, "other", 3).await;
        let registry = Arc::new(RoomRegistry::new());
        let usecase = JoinRoomUseCase::new(
            repo.clone(),
            registry.clone(),
            Arc::new(RoomSequencer::new()),
            DEFAULT_HISTORY_LIMIT,
        );
        let (alice, mut rx) = session("alice");

        // when:
        let outcome = usecase.execute(&alice, room("global")).await;

        // then:
        assert_eq!(
            outcome,
            JoinOutcome {
                newly_joined: true,
                history: HistoryReplay::Delivered(50)
            }
        );
        match rx.try_recv().unwrap() {
            OutboundEvent::History { room_id, messages } => {
                assert_eq!(room_id, room("global"));
                assert_eq!(messages.len(), 50);
                assert_eq!(messages[0].text.as_str(), "global-10");
                assert_eq!(messages[49].text.as_str(), "global-59");
                assert!(messages.windows(2).all(|w| w[0].id < w[1].id));
                assert!(messages.iter().all(|m| m.room_id == room("global")));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(registry.is_member(&room("global"), alice.id()).await);
    }

    #[tokio::test]
    async fn test_join_twice_is_idempotent() {
        // given:
        let repo = Arc::new(InMemoryMessageRepository::new());
        let registry = Arc::new(RoomRegistry::new());
        let usecase = JoinRoomUseCase::new(
            repo,
            registry.clone(),
            Arc::new(RoomSequencer::new()),
            DEFAULT_HISTORY_LIMIT,
        );
        let (alice, _rx) = session("alice");

        // when:
        usecase.execute(&alice, room("global")).await;
        let second = usecase.execute(&alice, room("global")).await;

        // then:
        assert!(!second.newly_joined);
        assert_eq!(registry.members(&room("global")).await.len(), 1);
    }

    #[tokio::test]
    async fn test_join_survives_history_failure() {
        // given: a store that cannot read
        let mut mock = MockMessageRepository::new();
        mock.expect_list_recent()
            .returning(|_, _| Err(RepositoryError::Storage("disk on fire".to_string())));
        let registry = Arc::new(RoomRegistry::new());
        let usecase = JoinRoomUseCase::new(
            Arc::new(mock),
            registry.clone(),
            Arc::new(RoomSequencer::new()),
            DEFAULT_HISTORY_LIMIT,
        );
        let (alice, mut rx) = session("alice");

        // when:
        let outcome = usecase.execute(&alice, room("global")).await;

        // then: membership kept, scoped error without storage details
        assert_eq!(outcome.history, HistoryReplay::Unavailable);
        assert!(registry.is_member(&room("global"), alice.id()).await);
        match rx.try_recv().unwrap() {
            OutboundEvent::Error(message) => {
                assert!(message.contains("global"));
                assert!(!message.contains("disk on fire"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resume_replays_only_missed_messages() {
        // given: 5 messages, the session had seen up to the second
        let repo = Arc::new(InMemoryMessageRepository::new());
        seed(&repo, "global", 5).await;
        let seen = repo.list_recent(&room("global"), 5).await.unwrap()[1].id;
        let registry = Arc::new(RoomRegistry::new());
        let usecase = JoinRoomUseCase::new(
            repo.clone(),
            registry.clone(),
            Arc::new(RoomSequencer::new()),
            DEFAULT_HISTORY_LIMIT,
        );
        let (alice, mut rx) = session("alice");

        // when:
        let replay = usecase
            .resume(&alice, room("global"), Some(seen))
            .await;

        // then:
        assert_eq!(replay, HistoryReplay::Delivered(3));
        assert!(registry.is_member(&room("global"), alice.id()).await);
        match rx.try_recv().unwrap() {
            OutboundEvent::History { messages, .. } => {
                let texts: Vec<_> = messages.iter().map(|m| m.text.as_str()).collect();
                assert_eq!(texts, vec!["global-2", "global-3", "global-4"]);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_resume_without_cursor_replays_everything_recent() {
        // given: nothing was delivered before the drop
        let repo = Arc::new(InMemoryMessageRepository::new());
        seed(&repo, "global", 2).await;
        let usecase = JoinRoomUseCase::new(
            repo,
            Arc::new(RoomRegistry::new()),
            Arc::new(RoomSequencer::new()),
            DEFAULT_HISTORY_LIMIT,
        );
        let (alice, mut rx) = session("alice");

        // when:
        let replay = usecase.resume(&alice, room("global"), None).await;

        // then:
        assert_eq!(replay, HistoryReplay::Delivered(2));
        assert!(matches!(
            rx.try_recv().unwrap(),
            OutboundEvent::History { messages, .. } if messages.len() == 2
        ));
    }

    #[tokio::test]
    async fn test_resume_up_to_date_sends_nothing() {
        // given:
        let repo = Arc::new(InMemoryMessageRepository::new());
        seed(&repo, "global", 2).await;
        let newest = repo.list_recent(&room("global"), 1).await.unwrap()[0].id;
        let usecase = JoinRoomUseCase::new(
            repo,
            Arc::new(RoomRegistry::new()),
            Arc::new(RoomSequencer::new()),
            DEFAULT_HISTORY_LIMIT,
        );
        let (alice, mut rx) = session("alice");

        // when:
        let replay = usecase.resume(&alice, room("global"), Some(newest)).await;

        // then:
        assert_eq!(replay, HistoryReplay::Delivered(0));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_subscribe_registers_without_history() {
        // given:
        let repo = Arc::new(InMemoryMessageRepository::new());
        seed(&repo, "channel_7", 3).await;
        let registry = Arc::new(RoomRegistry::new());
        let usecase = JoinRoomUseCase::new(
            repo,
            registry.clone(),
            Arc::new(RoomSequencer::new()),
            DEFAULT_HISTORY_LIMIT,
        );
        let (alice, mut rx) = session("alice");

        // when:
        let joined = usecase.subscribe(&alice, &room("channel_7")).await;

        // then:
        assert!(joined);
        assert!(registry.is_member(&room("channel_7"), alice.id()).await);
        assert!(rx.try_recv().is_err());
    }
}
