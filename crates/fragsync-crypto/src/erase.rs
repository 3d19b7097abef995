//! Secure erasure of secret buffers
//!
//! A superseded seed must not remain recoverable in process memory once
//! it has been advanced past: an attacker who later reads memory (core
//! dump, swap, a sibling process) should not be able to reconstruct past
//! fragments from a stale seed. Erasure is two-pass: first an overwrite
//! with unpredictable bytes (defeats a memory scan that expects to find
//! zeros and skips past them), then a final zero pass. Both passes go
//! through [`zeroize::Zeroize`], implemented with volatile writes so the
//! compiler cannot prove either store is dead and elide it, the risk
//! with a plain `for b in buf { *b = 0 }` loop right before the buffer is
//! dropped. A `compiler_fence` after each pass blocks the optimizer from
//! reordering the erasure past this call.

use std::sync::atomic::{compiler_fence, Ordering};

use rand::RngCore;
use zeroize::Zeroize;

/// Overwrite `buf` with unpredictable bytes, then zero, in place.
pub fn secure_erase(buf: &mut [u8]) {
    rand::thread_rng().fill_bytes(buf);
    compiler_fence(Ordering::SeqCst);
    buf.zeroize();
    compiler_fence(Ordering::SeqCst);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_zeroes_the_buffer() {
        let mut seed = vec![0xAAu8; 32];
        secure_erase(&mut seed);
        assert_eq!(seed, vec![0u8; 32]);
    }

    #[test]
    fn erase_of_empty_buffer_is_a_no_op() {
        let mut buf: Vec<u8> = Vec::new();
        secure_erase(&mut buf);
        assert!(buf.is_empty());
    }
}
