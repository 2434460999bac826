//! Engine error types.

use thiserror::Error;

use crate::collaborator::CollaboratorError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Worker panicked: {0}")]
    WorkerPanicked(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
