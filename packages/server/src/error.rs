//! Errors that stop the server.

use thiserror::Error;

use crate::domain::RepositoryError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind or serve: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to open message store: {0}")]
    Storage(#[from] RepositoryError),
}
