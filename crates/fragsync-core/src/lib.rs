//! # Fragsync Core
//!
//! Shared types, constants, and error taxonomy for the fragsync asemantic
//! fragment validation protocol: a local-only scheme that lets a receiver
//! verify, with no reverse channel, that an opaque fixed-length fragment
//! was produced by a holder of a shared secret at a point in time
//! monotonically ahead of anything previously accepted.
//!
//! This crate has no cryptographic logic of its own; see `fragsync-crypto`
//! for the primitives, `fragsync-sender`/`fragsync-receiver` for the
//! protocol state machines, and `fragsync-storage` for persistence.

pub mod error;
pub mod types;

pub use error::{ConfigError, ConfigResult, PersistenceError, SecurityFault, StructuralError};
pub use types::{constants, DomainTag, EvolFn, EvolutionMode, ProvisioningConfig, SecretSeed};

/// Core prelude for convenient imports across the workspace.
pub mod prelude {
    pub use crate::error::{ConfigError, ConfigResult, PersistenceError, SecurityFault, StructuralError};
    pub use crate::types::{constants, DomainTag, EvolFn, EvolutionMode, ProvisioningConfig};
}
