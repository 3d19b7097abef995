//! Persistence layer for fragsync receiver state.
//!
//! A receiver's durable footprint is exactly one small JSON blob,
//! independent of how many fragments it has ever accepted. This crate
//! owns the blob's wire shape and the atomic write-temp-then-rename
//! discipline that makes a crash mid-persist leave either the old blob
//! or the new one, never a corrupt hybrid.

pub mod blob;
pub mod error;

pub use blob::{BlobStore, PersistedBlob};
pub use error::{Result, StorageError};
