//! UseCase layer error definitions.
//!
//! All of these are scoped to the session or request that caused them;
//! none is fatal to the relay.

use thiserror::Error;

use crate::domain::{RepositoryError, ValueObjectError};

/// Errors from sending a message
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SendMessageError {
    /// Bad input. Nothing was persisted or broadcast.
    #[error(transparent)]
    Validation(#[from] ValueObjectError),

    /// The store failed. Nothing was persisted or broadcast.
    #[error("failed to store message: {0}")]
    Storage(String),
}

impl SendMessageError {
    /// Text shown to the sending client. Storage details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            SendMessageError::Validation(e) => e.to_string(),
            SendMessageError::Storage(_) => "failed to send message, please retry".to_string(),
        }
    }
}

impl From<RepositoryError> for SendMessageError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Storage(reason) => SendMessageError::Storage(reason),
        }
    }
}

/// Errors from reading room history over HTTP
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error(transparent)]
    Validation(#[from] ValueObjectError),

    #[error("history limit must be at least 1")]
    InvalidLimit,

    /// The caller may not view this room. Indistinguishable from a room
    /// that does not exist.
    #[error("room not found: {0}")]
    NotFound(String),

    #[error("failed to load history: {0}")]
    Storage(String),
}

impl From<RepositoryError> for HistoryError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Storage(reason) => HistoryError::Storage(reason),
        }
    }
}
