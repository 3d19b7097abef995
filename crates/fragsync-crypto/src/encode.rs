//! Injective length-prefixed encoder
//!
//! `Encode(D, C, Z)` concatenates three byte strings, each prefixed by a
//! 4-byte big-endian length. This is injective over all triples of byte
//! strings individually `<= u32::MAX` bytes: no pair of distinct triples
//! can produce the same encoding, which is what prevents
//! concatenation-ambiguity attacks across `(D, C, Z)`.

use crate::error::{CryptoError, Result};

/// Encode `(domain, content, evolution_param)` into a single injective
/// byte string suitable for feeding into a PRF or XOF.
pub fn encode(domain: &[u8], content: &[u8], evolution_param: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(12 + domain.len() + content.len() + evolution_param.len());
    for part in [domain, content, evolution_param] {
        write_length_prefixed(&mut out, part)?;
    }
    Ok(out)
}

fn write_length_prefixed(out: &mut Vec<u8>, part: &[u8]) -> Result<()> {
    let len: u32 = part
        .len()
        .try_into()
        .map_err(|_| CryptoError::ComponentTooLarge(part.len()))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(part);
    Ok(())
}
