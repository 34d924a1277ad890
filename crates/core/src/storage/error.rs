use thiserror::Error;

use crate::quiz::DatasetError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },
    #[error("{entity_type} already exists: {id}")]
    AlreadyExists {
        entity_type: &'static str,
        id: String,
    },
    #[error("Integrity violation: {0}")]
    IntegrityViolation(String),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Query failed: {0}")]
    QueryFailed(String),
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DatasetError> for RepositoryError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::DuplicateId { entity_type, id } => {
                RepositoryError::AlreadyExists { entity_type, id }
            }
            other => RepositoryError::IntegrityViolation(other.to_string()),
        }
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
