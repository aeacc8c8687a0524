use thiserror::Error;

/// Failures surfaced by a dog storage backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;
