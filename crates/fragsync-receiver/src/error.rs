//! Receiver-side error type: config/structural/security-fault/storage.

use fragsync_core::error::{ConfigError, SecurityFault, StructuralError};
use fragsync_crypto::error::CryptoError;
use fragsync_storage::error::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReceiverError>;

#[derive(Error, Debug)]
pub enum ReceiverError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    /// A distinguished fault that halts the receiver until an operator
    /// resynchronizes it. Never raised for an ordinary validation
    /// REJECT, only for tampering with durable state.
    #[error(transparent)]
    SecurityFault(#[from] SecurityFault),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
