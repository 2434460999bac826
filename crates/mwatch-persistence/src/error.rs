//! Persistence error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid log configuration: {0}")]
    Config(String),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
