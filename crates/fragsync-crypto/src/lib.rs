//! Cryptographic primitives for asemantic fragment validation.
//!
//! This crate implements the protocol's four building blocks in
//! isolation from any sender/receiver state machinery:
//!
//! - [`encode`] - injective length-prefixed encoding of `(domain,
//!   content, evolution_param)`.
//! - [`kdf`] - one-way seed evolution, `K_{i+1} = KDF(K_i)`.
//! - [`fragment`] - `compute_fragment`, the keyed/unkeyed PRF/XOF
//!   compression step that produces the transmitted fragment.
//! - [`compare`] - constant-time fragment comparison.
//! - [`erase`] - secure erasure of superseded seed material.

pub mod compare;
pub mod encode;
pub mod erase;
pub mod error;
pub mod fragment;
pub mod kdf;

pub use compare::constant_time_equal;
pub use encode::encode as encode_triple;
pub use erase::secure_erase;
pub use error::{CryptoError, Result};
pub use fragment::compute_fragment;

/// Convenience re-exports for downstream crates.
pub mod prelude {
    pub use crate::compare::constant_time_equal;
    pub use crate::encode::encode;
    pub use crate::erase::secure_erase;
    pub use crate::error::{CryptoError, Result};
    pub use crate::fragment::compute_fragment;
    pub use crate::kdf;
}
