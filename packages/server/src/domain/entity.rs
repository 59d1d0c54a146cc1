//! Core domain models for the chat relay.

use std::collections::HashMap;

use tokio::sync::mpsc::UnboundedSender;

use super::value_object::{
    MessageId, MessageText, ResumeToken, RoomId, SessionId, Timestamp, UserId,
};

/// Display name given to sessions without a verified identity.
pub const ANONYMOUS_DISPLAY_NAME: &str = "Anonymous";

/// Who is on the other end of a session.
///
/// Fixed for the lifetime of the session (and carried over on resume).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: UserId,
    pub display_name: String,
    /// `true` when asserted by the external auth layer.
    pub verified: bool,
}

impl Identity {
    /// An identity vouched for by the auth layer.
    ///
    /// A blank display name falls back to the user id.
    pub fn verified(id: UserId, display_name: Option<String>) -> Self {
        let display_name = display_name
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.as_str().to_string());
        Self {
            id,
            display_name,
            verified: true,
        }
    }

    /// Placeholder identity for a session that connected without credentials.
    pub fn anonymous(session_id: &SessionId) -> Self {
        Self {
            id: UserId::placeholder(format!("anonymous-{session_id}")),
            display_name: ANONYMOUS_DISPLAY_NAME.to_string(),
            verified: false,
        }
    }

    /// Resolve the author recorded on an outgoing message.
    ///
    /// A verified identity always wins. Anonymous sessions may carry an
    /// author id asserted by the collaborator layer in the payload.
    pub fn author(&self, asserted_author_id: Option<&str>) -> Author {
        if !self.verified
            && let Some(id) = asserted_author_id.and_then(|raw| UserId::new(raw).ok())
        {
            return Author {
                id,
                name: self.display_name.clone(),
            };
        }
        Author {
            id: self.id.clone(),
            name: self.display_name.clone(),
        }
    }
}

/// Author fields stamped onto a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
}

/// A validated message that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub room_id: RoomId,
    pub author: Author,
    pub text: MessageText,
}

impl NewMessage {
    pub fn new(room_id: RoomId, author: Author, text: MessageText) -> Self {
        Self {
            room_id,
            author,
            text,
        }
    }
}

/// A persisted chat message. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub room_id: RoomId,
    pub author_id: UserId,
    pub author_name: String,
    pub text: MessageText,
    pub created_at: Timestamp,
}

impl Message {
    /// Complete a draft with the store-assigned id and timestamp.
    pub fn from_draft(draft: NewMessage, id: MessageId, created_at: Timestamp) -> Self {
        Self {
            id,
            room_id: draft.room_id,
            author_id: draft.author.id,
            author_name: draft.author.name,
            text: draft.text,
            created_at,
        }
    }
}

/// Everything the relay pushes to a single session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// First event on every connection.
    Session {
        session_id: SessionId,
        resume_token: ResumeToken,
        resumed: bool,
        rooms: Vec<RoomId>,
    },
    /// Recent messages of a room, oldest first. Sent only to the joiner.
    History {
        room_id: RoomId,
        messages: Vec<Message>,
    },
    /// A freshly persisted message, broadcast to room members.
    Message(Message),
    /// Human-readable error scoped to this session.
    Error(String),
    Pong(Timestamp),
}

/// Outbound delivery channel to a connection's writer task.
pub type Outbox = UnboundedSender<OutboundEvent>;

/// One live connection.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    identity: Identity,
    resume_token: ResumeToken,
    outbox: Outbox,
}

impl Session {
    pub fn new(
        id: SessionId,
        identity: Identity,
        resume_token: ResumeToken,
        outbox: Outbox,
    ) -> Self {
        Self {
            id,
            identity,
            resume_token,
            outbox,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn resume_token(&self) -> &ResumeToken {
        &self.resume_token
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Queue an event for this session.
    ///
    /// Returns `false` when the connection is already gone; callers treat
    /// that as a skipped delivery, not an error.
    pub fn notify(&self, event: OutboundEvent) -> bool {
        self.outbox.send(event).is_ok()
    }

    pub fn notify_error(&self, message: impl Into<String>) -> bool {
        self.notify(OutboundEvent::Error(message.into()))
    }
}

/// Newest message id written to a connection, per room.
///
/// Advanced by the connection's writer after a frame is sent, so it never
/// runs ahead of what the client could have seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryCursor {
    rooms: HashMap<RoomId, MessageId>,
}

impl DeliveryCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance past the messages carried by `event`.
    pub fn record(&mut self, event: &OutboundEvent) {
        let (room_id, id) = match event {
            OutboundEvent::Message(message) => (&message.room_id, message.id),
            OutboundEvent::History { room_id, messages } => match messages.last() {
                Some(last) => (room_id, last.id),
                None => return,
            },
            _ => return,
        };
        let seen = self.rooms.entry(room_id.clone()).or_insert(id);
        if *seen < id {
            *seen = id;
        }
    }

    pub fn last_delivered(&self, room_id: &RoomId) -> Option<MessageId> {
        self.rooms.get(room_id).copied()
    }

    /// Forget rooms not in `rooms`.
    pub fn retain_rooms(&mut self, rooms: &[RoomId]) {
        self.rooms.retain(|room_id, _| rooms.contains(room_id));
    }
}

/// What survives of a session between disconnect and resume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DormantSession {
    pub identity: Identity,
    pub rooms: Vec<RoomId>,
    /// Where delivery stopped in each room.
    pub delivered: DeliveryCursor,
}

impl DormantSession {
    pub fn new(identity: Identity, rooms: Vec<RoomId>, mut delivered: DeliveryCursor) -> Self {
        delivered.retain_rooms(&rooms);
        Self {
            identity,
            rooms,
            delivered,
        }
    }
}
