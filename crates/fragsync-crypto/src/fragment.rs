//! Fragment construction: `F_i = Trunc_ell(F(Encode(D, C, Z_i)))`
//!
//! Two sub-modes, selected by whether a `key` is supplied:
//! - **Keyed**: `key` is used as a BLAKE3 keyed-hash key (the PRF), and
//!   the message is `Encode(domain, content, evolution_param)`.
//! - **Unkeyed**: the same encoded message is squeezed through plain
//!   (unkeyed) BLAKE3 as an extendable-output function.
//!
//! In both sub-modes, BLAKE3's `finalize_xof` squeezes exactly `ell / 8`
//! bytes directly: no hand-rolled counter-mode block concatenation is
//! needed, since that is precisely what a XOF already does.
//!
//! Mode A passes the same seed as both `evolution_param` (inside
//! `Encode`) and `key` (as the PRF key): the seed keys the PRF *and* is
//! folded into the encoded message. This double binding is deliberate
//! (see DESIGN.md) rather than an accident of the two call sites
//! happening to share a value.

use fragsync_core::constants::MIN_FRAGMENT_BITS;

use crate::encode::encode;
use crate::error::{CryptoError, Result};

/// Compute a fragment `F_i` from its constituent parts.
///
/// `ell_bits` must be `>= 256` and a multiple of 8. `key` selects the
/// keyed sub-mode when `Some`.
pub fn compute_fragment(
    domain: &[u8],
    content: &[u8],
    evolution_param: &[u8],
    ell_bits: u32,
    key: Option<&[u8]>,
) -> Result<Vec<u8>> {
    if ell_bits < MIN_FRAGMENT_BITS || ell_bits % 8 != 0 {
        return Err(CryptoError::InvalidFragmentLength {
            min: MIN_FRAGMENT_BITS,
            got: ell_bits,
        });
    }

    let message = encode(domain, content, evolution_param)
        .map_err(|_| CryptoError::ComponentTooLarge(domain.len() + content.len() + evolution_param.len()))?;

    let mut hasher = match key {
        Some(k) => blake3::Hasher::new_keyed(&derive_hash_key(k)),
        None => blake3::Hasher::new(),
    };
    hasher.update(&message);

    let out_len = (ell_bits / 8) as usize;
    let mut out = vec![0u8; out_len];
    let mut reader = hasher.finalize_xof();
    reader.fill(&mut out);
    Ok(out)
}

/// BLAKE3 keyed hashing requires an exact 32-byte key; a Mode A seed may
/// be longer, so it is first reduced with a plain hash. This is a
/// deterministic, lossless-for-security-purposes step, not a second KDF
/// evolution.
fn derive_hash_key(key_material: &[u8]) -> [u8; 32] {
    *blake3::hash(key_material).as_bytes()
}
