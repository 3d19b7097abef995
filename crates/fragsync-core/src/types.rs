//! Shared type definitions for the fragsync fragment validation protocol
//!
//! A domain separation tag `D`, an evolution mode tag distinguishing
//! the secret-seed chain (Mode A) from the deterministic, publicly
//! computable evolution (Mode B), and the provisioning inputs both
//! endpoints must share.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Deref;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Domain separation tag `D`, provisioned out of band, constant for the
/// lifetime of a sender/receiver pair.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTag(Vec<u8>);

impl DomainTag {
    /// Wrap raw bytes as a domain tag, enforcing the minimum length.
    pub fn new(bytes: Vec<u8>) -> Result<Self, crate::error::ConfigError> {
        if bytes.len() < constants::MIN_DOMAIN_LEN {
            return Err(crate::error::ConfigError::DomainTooShort {
                min: constants::MIN_DOMAIN_LEN,
                got: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, crate::error::ConfigError> {
        let bytes = hex::decode(s)
            .map_err(|e| crate::error::ConfigError::InvalidHex(e.to_string()))?;
        Self::new(bytes)
    }
}

impl fmt::Debug for DomainTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DomainTag({}...)", &self.to_hex()[..16.min(self.to_hex().len())])
    }
}

/// Mode A's secret seed `K_i`, held in a buffer that is volatile-zeroed
/// both on every explicit replacement (superseded seeds must not
/// linger after `advance`) and on final `Drop`: no seed bytes may
/// outlive their owning state object.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretSeed(Vec<u8>);

impl SecretSeed {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Mutable access to the underlying buffer, for in-place erasure.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }

    pub fn into_bytes(mut self) -> Vec<u8> {
        std::mem::take(&mut self.0)
    }
}

impl Deref for SecretSeed {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretSeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretSeed({} bytes, redacted)", self.0.len())
    }
}

/// Which evolution discipline a sender/receiver pair uses.
///
/// Mode A evolves a secret seed unidirectionally (`K_{i+1} = KDF(K_i)`),
/// providing authentication and forward secrecy. Mode B evolves a public,
/// pure function of the logical index: no seed, no authentication unless
/// the content representation or fragment function is otherwise keyed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvolutionMode {
    A,
    B,
}

impl fmt::Display for EvolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolutionMode::A => write!(f, "A"),
            EvolutionMode::B => write!(f, "B"),
        }
    }
}

/// Deterministic evolution function for Mode B: `Evol(i) -> Z_i`.
///
/// A bare function pointer rather than a boxed closure: Mode B's whole
/// point is that both endpoints can recompute `Z_i` from nothing but the
/// index, so the function must not be allowed to carry captured state
/// that only one side would know about.
pub type EvolFn = fn(u64) -> Vec<u8>;

/// Provisioning inputs shared out of band by both endpoints.
///
/// Holds only the non-secret parameters (domain, mode tag, fragment
/// length, window width); the Mode A seed and Mode B evolution function
/// are supplied separately to the builder/state constructors so this
/// struct can be serialized and distributed as ordinary configuration
/// without ever touching key material.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Domain separation tag, hex-encoded on the wire.
    pub domain: String,
    pub mode: EvolutionMode,
    /// Fragment length in bits, `>= 256` and a multiple of 8.
    pub fragment_bits: u32,
    /// Window width `nu`, recommended 0-10.
    pub window: u32,
    /// Initial anchor `t` for a fresh receiver.
    #[serde(default)]
    pub initial_anchor: u64,
}

impl ProvisioningConfig {
    pub fn domain_tag(&self) -> Result<DomainTag, crate::error::ConfigError> {
        DomainTag::from_hex(&self.domain)
    }
}

/// System constants governing the protocol's parameter floors.
pub mod constants {
    /// Minimum domain tag length in bytes (>= 128 bits).
    pub const MIN_DOMAIN_LEN: usize = 16;

    /// Minimum Mode A seed length in bytes (>= 256 bits).
    pub const MIN_SEED_LEN: usize = 32;

    /// Minimum fragment length in bits.
    pub const MIN_FRAGMENT_BITS: u32 = 256;

    /// Recommended default window width `nu`.
    pub const DEFAULT_WINDOW: u32 = 7;

    /// Upper bound on the recommended window width.
    pub const MAX_RECOMMENDED_WINDOW: u32 = 10;

    /// Domain-separation label mixed into every KDF evolution step.
    pub const KDF_CONTEXT_LABEL: &[u8] = b"fragsync-kdf-v1";

    /// Current persisted-blob format version.
    pub const BLOB_VERSION: u32 = 1;
}
