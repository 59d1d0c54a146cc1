//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// UserId validation error
    #[error("user id cannot be empty")]
    UserIdEmpty,

    /// UserId too long error
    #[error("user id cannot exceed {max} characters (got {actual})")]
    UserIdTooLong { max: usize, actual: usize },

    /// RoomId validation error
    #[error("room id cannot be empty")]
    RoomIdEmpty,

    /// RoomId too long error
    #[error("room id cannot exceed {max} characters (got {actual})")]
    RoomIdTooLong { max: usize, actual: usize },

    /// MessageText validation error (empty after trimming)
    #[error("message cannot be empty")]
    MessageTextEmpty,

    /// MessageText too long error
    #[error("message cannot exceed {max} characters (got {actual})")]
    MessageTextTooLong { max: usize, actual: usize },
}

/// Errors raised by a message store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backing store failed or is unavailable. Nothing was written.
    #[error("message store unavailable: {0}")]
    Storage(String),
}
