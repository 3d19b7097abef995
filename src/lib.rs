//! Workspace facade for the fragsync asemantic fragment validation
//! protocol.
//!
//! Re-exports the public surface of each member crate so a single
//! `fragsync::prelude::*` import pulls in everything needed to
//! provision, emit, and validate fragments. The individual crates
//! (`fragsync-core`, `fragsync-crypto`, `fragsync-sender`,
//! `fragsync-receiver`, `fragsync-storage`) remain independently
//! usable; this crate adds nothing but convenience and hosts the
//! end-to-end tests under `tests/`.

pub use fragsync_core as core;
pub use fragsync_crypto as crypto;
pub use fragsync_receiver as receiver;
pub use fragsync_sender as sender;
pub use fragsync_storage as storage;

pub mod prelude {
    pub use fragsync_core::{ConfigError, DomainTag, EvolFn, EvolutionMode, ProvisioningConfig, SecretSeed};
    pub use fragsync_crypto::{compute_fragment, constant_time_equal, kdf};
    pub use fragsync_receiver::{ReceiverError, ReceiverState, TraversalPolicy, ValidationOutcome, Validator};
    pub use fragsync_sender::{BuilderSnapshot, FragmentBuilder, SenderError};
    pub use fragsync_storage::{BlobStore, PersistedBlob, StorageError};
}
