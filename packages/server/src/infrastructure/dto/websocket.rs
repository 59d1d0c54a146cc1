//! WebSocket message DTOs for the chat relay.
//!
//! Every frame is a JSON object tagged by `type` (kebab-case) with camelCase
//! fields.

use murmur_shared::time::timestamp_to_rfc3339;
use serde::{Deserialize, Serialize};

use crate::domain::{Message, OutboundEvent};

/// Events sent by clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    Join {
        room_id: String,
    },
    /// Subscribe to a channel's room without a history replay.
    JoinChannel {
        channel_id: String,
    },
    Leave {
        room_id: String,
    },
    Send {
        room_id: String,
        text: String,
        /// Asserted by the auth layer in front of the relay.
        #[serde(default)]
        author_id: Option<String>,
    },
    Ping,
}

/// A persisted message as clients see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageDto {
    pub id: i64,
    pub room_id: String,
    pub author_id: String,
    pub author_name: String,
    pub text: String,
    /// RFC 3339, UTC
    pub created_at: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id.value(),
            room_id: message.room_id.as_str().to_string(),
            author_id: message.author_id.as_str().to_string(),
            author_name: message.author_name.clone(),
            text: message.text.as_str().to_string(),
            created_at: timestamp_to_rfc3339(message.created_at.value()),
        }
    }
}

/// Events pushed by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    Session {
        session_id: String,
        resume_token: String,
        resumed: bool,
        rooms: Vec<String>,
    },
    History {
        room_id: String,
        messages: Vec<MessageDto>,
    },
    Message(MessageDto),
    Error {
        message: String,
    },
    Pong {
        /// Unix milliseconds
        time: i64,
    },
}

impl From<OutboundEvent> for ServerEvent {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::Session {
                session_id,
                resume_token,
                resumed,
                rooms,
            } => ServerEvent::Session {
                session_id: session_id.as_str().to_string(),
                resume_token: resume_token.as_str().to_string(),
                resumed,
                rooms: rooms.into_iter().map(|r| r.into_string()).collect(),
            },
            OutboundEvent::History { room_id, messages } => ServerEvent::History {
                room_id: room_id.into_string(),
                messages: messages.iter().map(MessageDto::from).collect(),
            },
            OutboundEvent::Message(message) => ServerEvent::Message(MessageDto::from(&message)),
            OutboundEvent::Error(message) => ServerEvent::Error { message },
            OutboundEvent::Pong(time) => ServerEvent::Pong { time: time.value() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MessageId, MessageText, RoomId, Timestamp, UserId};
    use serde_json::json;

    #[test]
    fn test_parse_send_event() {
        // given:
        let raw = r#"{"type":"send","roomId":"global","text":"hello","authorId":"u1"}"#;

        // when:
        let event: ClientEvent = serde_json::from_str(raw).unwrap();

        // then:
        assert_eq!(
            event,
            ClientEvent::Send {
                room_id: "global".to_string(),
                text: "hello".to_string(),
                author_id: Some("u1".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_send_event_without_author() {
        // when:
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"send","roomId":"r","text":"t"}"#).unwrap();

        // then:
        assert!(matches!(event, ClientEvent::Send { author_id: None, .. }));
    }

    #[test]
    fn test_parse_join_and_ping() {
        // when:
        let join: ClientEvent = serde_json::from_str(r#"{"type":"join","roomId":"r"}"#).unwrap();
        let ping: ClientEvent = serde_json::from_str(r#"{"type":"ping"}"#).unwrap();

        // then:
        assert_eq!(
            join,
            ClientEvent::Join {
                room_id: "r".to_string()
            }
        );
        assert_eq!(ping, ClientEvent::Ping);
    }

    #[test]
    fn test_parse_join_channel_event() {
        // when:
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"join-channel","channelId":"42"}"#).unwrap();

        // then:
        assert_eq!(
            event,
            ClientEvent::JoinChannel {
                channel_id: "42".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_event_type_is_rejected() {
        // when:
        let result = serde_json::from_str::<ClientEvent>(r#"{"type":"typing","roomId":"r"}"#);

        // then:
        assert!(result.is_err());
    }

    #[test]
    fn test_message_event_is_flattened() {
        // given:
        let message = Message {
            id: MessageId::new(3),
            room_id: RoomId::new("global").unwrap(),
            author_id: UserId::new("alice").unwrap(),
            author_name: "Alice".to_string(),
            text: MessageText::new("hello").unwrap(),
            created_at: Timestamp::new(1_672_498_800_000),
        };

        // when:
        let value = serde_json::to_value(ServerEvent::from(OutboundEvent::Message(message))).unwrap();

        // then:
        assert_eq!(
            value,
            json!({
                "type": "message",
                "id": 3,
                "roomId": "global",
                "authorId": "alice",
                "authorName": "Alice",
                "text": "hello",
                "createdAt": "2022-12-31T15:00:00.000Z"
            })
        );
    }

    #[test]
    fn test_error_and_pong_events() {
        // when:
        let error = serde_json::to_value(ServerEvent::from(OutboundEvent::Error(
            "message cannot be empty".to_string(),
        )))
        .unwrap();
        let pong =
            serde_json::to_value(ServerEvent::from(OutboundEvent::Pong(Timestamp::new(42)))).unwrap();

        // then:
        assert_eq!(
            error,
            json!({"type": "error", "message": "message cannot be empty"})
        );
        assert_eq!(pong, json!({"type": "pong", "time": 42}));
    }
}
