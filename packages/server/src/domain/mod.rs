//! Domain layer for the chat relay.
//!
//! This module contains business rules that are independent of the
//! transport (DTOs, WebSocket framing) and of the storage backend.

pub mod access;
pub mod entity;
pub mod error;
pub mod factory;
pub mod recovery;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use access::{OpenAccess, RoomAccess};
#[cfg(test)]
pub use access::MockRoomAccess;
pub use entity::{
    Author, DeliveryCursor, DormantSession, Identity, Message, NewMessage, OutboundEvent, Outbox,
    Session,
};
pub use error::{RepositoryError, ValueObjectError};
pub use factory::{ResumeTokenFactory, SessionIdFactory};
pub use recovery::RecoveryCache;
pub use registry::{Member, RegistryStats, RoomRegistry};
pub use repository::MessageRepository;
#[cfg(test)]
pub use repository::MockMessageRepository;
pub use value_object::{
    MessageId, MessageText, ResumeToken, RoomId, SessionId, Timestamp, UserId,
};
