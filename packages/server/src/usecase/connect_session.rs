//! UseCase: セッション接続処理
//!
//! Allocates a session for a new connection. A client presenting a resume
//! token inside the recovery window gets its previous identity and room
//! memberships back without re-joining, plus whatever was posted to those
//! rooms while it was away.

use std::sync::Arc;

use crate::domain::{
    DeliveryCursor, Identity, OutboundEvent, Outbox, RecoveryCache, ResumeToken,
    ResumeTokenFactory, RoomId, RoomRegistry, Session, SessionIdFactory,
};

use super::join_room::JoinRoomUseCase;

#[derive(Debug, Clone)]
pub struct ConnectOutcome {
    pub session: Session,
    /// `true` when a dormant session was restored.
    pub resumed: bool,
    pub restored_rooms: Vec<RoomId>,
}

/// セッション接続のユースケース
pub struct ConnectSessionUseCase {
    registry: Arc<RoomRegistry>,
    recovery: Arc<RecoveryCache>,
    /// Re-registers restored rooms and replays what the session missed.
    join: JoinRoomUseCase,
    replay_history_on_resume: bool,
}

impl ConnectSessionUseCase {
    pub fn new(
        registry: Arc<RoomRegistry>,
        recovery: Arc<RecoveryCache>,
        join: JoinRoomUseCase,
        replay_history_on_resume: bool,
    ) -> Self {
        Self {
            registry,
            recovery,
            join,
            replay_history_on_resume,
        }
    }

    /// Connect a new session.
    ///
    /// # Arguments
    ///
    /// * `verified` - identity asserted by the auth layer, `None` for anonymous
    /// * `outbox` - delivery channel to the connection
    /// * `resume_token` - token from a previous connection, if any
    pub async fn execute(
        &self,
        verified: Option<Identity>,
        outbox: Outbox,
        resume_token: Option<ResumeToken>,
    ) -> ConnectOutcome {
        let session_id = SessionIdFactory::generate();

        let dormant = match &resume_token {
            Some(token) => {
                let dormant = self.recovery.take(token).await;
                if dormant.is_none() {
                    tracing::info!(
                        "Resume token for session '{}' is unknown or expired; starting fresh",
                        session_id
                    );
                }
                dormant
            }
            None => None,
        };

        // A verified caller can only resume its own session.
        let dormant = match (dormant, &verified) {
            (Some(dormant), Some(verified)) if dormant.identity.id != verified.id => {
                tracing::warn!(
                    "Resume token of '{}' presented by '{}'; discarding it for session '{}'",
                    dormant.identity.id,
                    verified.id,
                    session_id
                );
                None
            }
            (dormant, _) => dormant,
        };

        let resumed = dormant.is_some();
        let (identity, rooms, delivered) = match dormant {
            Some(dormant) => (dormant.identity, dormant.rooms, dormant.delivered),
            None => (
                verified.unwrap_or_else(|| Identity::anonymous(&session_id)),
                Vec::new(),
                DeliveryCursor::new(),
            ),
        };

        let session = Session::new(session_id, identity, ResumeTokenFactory::generate(), outbox);
        self.registry.connect(&session).await;

        // Queued before any room traffic so it is always the first frame.
        session.notify(OutboundEvent::Session {
            session_id: session.id().clone(),
            resume_token: session.resume_token().clone(),
            resumed,
            rooms: rooms.clone(),
        });

        for room_id in &rooms {
            if self.replay_history_on_resume {
                self.join.execute(&session, room_id.clone()).await;
            } else {
                self.join
                    .resume(&session, room_id.clone(), delivered.last_delivered(room_id))
                    .await;
            }
        }

        tracing::info!(
            "Session '{}' connected as '{}' (resumed: {}, rooms: {})",
            session.id(),
            session.identity().id,
            resumed,
            rooms.len()
        );

        ConnectOutcome {
            session,
            resumed,
            restored_rooms: rooms,
        }
    }
}
