//! Persistence error type.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error persisting state: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize state blob: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("persisted state blob is malformed: {0}")]
    Malformed(String),
}
