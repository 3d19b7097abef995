//! Cryptographic error types

use thiserror::Error;

/// Result type for cryptographic operations
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors in cryptographic primitive operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// One of the three `Encode` components exceeds the 4-byte length
    /// prefix's range.
    #[error("component too large to encode: {0} bytes exceeds u32 range")]
    ComponentTooLarge(usize),

    /// Requested fragment length is below the protocol floor or not a
    /// whole number of bytes.
    #[error("fragment length must be >= {min} bits and a multiple of 8, got {got}")]
    InvalidFragmentLength { min: u32, got: u32 },
}
