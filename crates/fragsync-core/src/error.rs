//! Shared error taxonomy for the fragsync fragment validation protocol
//!
//! Four of the five error categories from the error-handling design live
//! here so every crate in the workspace reports them identically:
//! configuration errors (fatal at construction), structural errors
//! (non-fatal, caller-recoverable), security faults (halt the receiver),
//! and persistence I/O errors. Validation outcomes (ACCEPT/REJECT) are
//! not errors at all and live in `fragsync-receiver` instead.

use thiserror::Error;

/// Result alias for fallible construction of protocol components.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration errors: invalid parameters at construction time.
///
/// Fatal to the component instance. Never retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("domain tag must be at least {min} bytes, got {got}")]
    DomainTooShort { min: usize, got: usize },

    #[error("invalid hex encoding: {0}")]
    InvalidHex(String),

    #[error("Mode A requires a seed of at least {min} bytes, got {got}")]
    SeedTooShort { min: usize, got: usize },

    #[error("Mode A requires a seed but none was provided")]
    MissingSeed,

    #[error("Mode B requires an evolution function but none was provided")]
    MissingEvolFn,

    #[error("fragment length must be >= {min} bits and a multiple of 8, got {got}")]
    InvalidFragmentLength { min: u32, got: u32 },
}

/// Structural errors: malformed input discovered at call time.
///
/// Non-fatal; the caller discards the offending input and continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructuralError {
    #[error("fragment length mismatch: expected {expected} bytes, got {got}")]
    FragmentLengthMismatch { expected: usize, got: usize },

    #[error("Mode B validator has no evolution function configured")]
    MissingEvolFn,

    #[error("receiver state has no seed (Mode A invariant violated)")]
    MissingSeed,

    #[error("persisted state blob is malformed: {0}")]
    MalformedBlob(String),
}

/// Security faults: conditions that must halt the receiver until an
/// operator intervenes. Never silently tolerated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecurityFault {
    #[error(
        "rollback detected: persisted anchor {persisted_anchor} / counter {persisted_counter} \
         is behind in-memory anchor {memory_anchor} / counter {memory_counter}"
    )]
    RollbackDetected {
        persisted_anchor: u64,
        persisted_counter: u64,
        memory_anchor: u64,
        memory_counter: u64,
    },
}

/// Persistence I/O errors, bubbled up from `advance`/`commit_advance`.
///
/// The in-memory state mutation MUST be undone by the caller before this
/// error is returned, preserving the atomicity of the two-phase commit.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("I/O error persisting state: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize state blob: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Rollback(#[from] SecurityFault),
}
