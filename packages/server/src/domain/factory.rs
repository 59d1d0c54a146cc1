//! Domain factories for creating identifiers.

use super::{ResumeToken, SessionId};

/// Factory for generating SessionId instances.
///
/// Keeps id generation separate from the value object so tests can build
/// sessions with readable ids.
pub struct SessionIdFactory;

impl SessionIdFactory {
    /// Generate a new SessionId from a random UUID v4.
    pub fn generate() -> SessionId {
        SessionId::new(uuid::Uuid::new_v4().to_string())
    }
}

/// Factory for generating resume tokens.
pub struct ResumeTokenFactory;

impl ResumeTokenFactory {
    /// Generate an unguessable single-use token (UUID v4, simple format).
    pub fn generate() -> ResumeToken {
        ResumeToken::new(uuid::Uuid::new_v4().simple().to_string())
    }
}
