//! Sender-side error type: config errors at construction, crypto errors
//! at build time.

use fragsync_core::error::ConfigError;
use fragsync_crypto::error::CryptoError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SenderError>;

#[derive(Error, Debug)]
pub enum SenderError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("snapshot is malformed: {0}")]
    MalformedSnapshot(String),

    #[error("failed to (de)serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}
