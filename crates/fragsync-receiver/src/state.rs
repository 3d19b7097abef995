//! `ReceiverState`: the receiver-side half of the protocol.
//!
//! Owns the monotonic anchor `t` and, in Mode A, the seed `K_t` aligned
//! with it. Nothing else survives here: no list of accepted fragments,
//! no per-fragment history. That is what keeps the durable footprint
//! `O(1)` regardless of how many fragments have ever been validated.

use std::ops::RangeInclusive;
use std::path::Path;

use fragsync_core::error::SecurityFault;
use fragsync_core::types::{constants, DomainTag, EvolFn, EvolutionMode, ProvisioningConfig, SecretSeed};
use fragsync_crypto::{kdf, secure_erase};
use fragsync_storage::{BlobStore, PersistedBlob};

use crate::error::{ReceiverError, Result};

/// The mode-specific half of a [`ReceiverState`]: either a secret seed
/// chain (Mode A) or a bare pointer to the public evolution function
/// the validator will call (Mode B, which owns no secret at all).
enum ReceiverMode {
    A { seed: SecretSeed },
    B { evol_fn: EvolFn },
}

/// Receiver-side state: `{ domain, mode, anchor, rollback_counter }`.
///
/// Constructed from provisioning inputs, mutated only through
/// [`ReceiverState::advance`], and every seed buffer it ever holds is
/// zeroized both on replacement and on final `Drop` (`SecretSeed` is
/// `ZeroizeOnDrop`).
pub struct ReceiverState {
    domain: DomainTag,
    mode: ReceiverMode,
    anchor: u64,
    rollback_counter: u64,
    store: Option<BlobStore>,
}

impl ReceiverState {
    /// Construct a fresh, unpersisted Mode A receiver state.
    pub fn mode_a(domain: DomainTag, seed: Vec<u8>, initial_anchor: u64) -> Result<Self> {
        if seed.len() < constants::MIN_SEED_LEN {
            return Err(ReceiverError::Config(fragsync_core::error::ConfigError::SeedTooShort {
                min: constants::MIN_SEED_LEN,
                got: seed.len(),
            }));
        }
        Ok(Self {
            domain,
            mode: ReceiverMode::A { seed: SecretSeed::new(seed) },
            anchor: initial_anchor,
            rollback_counter: 0,
            store: None,
        })
    }

    /// Construct a fresh, unpersisted Mode B receiver state.
    pub fn mode_b(domain: DomainTag, evol_fn: EvolFn, initial_anchor: u64) -> Result<Self> {
        Ok(Self {
            domain,
            mode: ReceiverMode::B { evol_fn },
            anchor: initial_anchor,
            rollback_counter: 0,
            store: None,
        })
    }

    /// Construct (or restore) a Mode A receiver state backed by a
    /// durable blob at `path`.
    ///
    /// - Missing blob: starts fresh from `provisioning.initial_anchor`
    ///   and `initial_seed`.
    /// - Malformed blob: logs a warning and starts fresh, exactly as if
    ///   the blob were absent. A corrupt file on disk must never be
    ///   fatal to the receiver.
    /// - Valid blob whose anchor is behind `provisioning.initial_anchor`:
    ///   a [`SecurityFault::RollbackDetected`]. The operator-configured
    ///   floor stands in for an externally anchored reference value
    ///   (see DESIGN.md).
    pub fn load_or_init_mode_a(
        path: impl AsRef<Path>,
        provisioning: &ProvisioningConfig,
        initial_seed: Vec<u8>,
    ) -> Result<Self> {
        if provisioning.mode != EvolutionMode::A {
            return Err(ReceiverError::Config(fragsync_core::error::ConfigError::MissingSeed));
        }
        let domain = provisioning.domain_tag()?;
        let store = BlobStore::new(path);

        match store.load() {
            Ok(None) => Ok(Self {
                domain,
                mode: ReceiverMode::A { seed: SecretSeed::new(initial_seed) },
                anchor: provisioning.initial_anchor,
                rollback_counter: 0,
                store: Some(store),
            }),
            Ok(Some(blob)) => {
                if blob.anchor < provisioning.initial_anchor || blob.mode != EvolutionMode::A {
                    return Err(ReceiverError::SecurityFault(SecurityFault::RollbackDetected {
                        persisted_anchor: blob.anchor,
                        persisted_counter: blob.rollback_counter,
                        memory_anchor: provisioning.initial_anchor,
                        memory_counter: 0,
                    }));
                }
                let seed = blob
                    .seed_bytes()
                    .map_err(|_| {
                        fragsync_core::error::StructuralError::MalformedBlob(
                            "Mode A blob missing seed".into(),
                        )
                    })?
                    .ok_or_else(|| {
                        fragsync_core::error::StructuralError::MalformedBlob(
                            "Mode A blob missing seed".into(),
                        )
                    })?;
                Ok(Self {
                    domain,
                    mode: ReceiverMode::A { seed: SecretSeed::new(seed) },
                    anchor: blob.anchor,
                    rollback_counter: blob.rollback_counter,
                    store: Some(store),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted receiver state blob is malformed, starting from provisioned defaults");
                Ok(Self {
                    domain,
                    mode: ReceiverMode::A { seed: SecretSeed::new(initial_seed) },
                    anchor: provisioning.initial_anchor,
                    rollback_counter: 0,
                    store: Some(store),
                })
            }
        }
    }

    /// Construct (or restore) a Mode B receiver state backed by a
    /// durable blob at `path`. Mode B carries no seed, so only the
    /// anchor is ever loaded from disk.
    pub fn load_or_init_mode_b(
        path: impl AsRef<Path>,
        provisioning: &ProvisioningConfig,
        evol_fn: EvolFn,
    ) -> Result<Self> {
        if provisioning.mode != EvolutionMode::B {
            return Err(ReceiverError::Config(fragsync_core::error::ConfigError::MissingEvolFn));
        }
        let domain = provisioning.domain_tag()?;
        let store = BlobStore::new(path);

        match store.load() {
            Ok(None) => Ok(Self {
                domain,
                mode: ReceiverMode::B { evol_fn },
                anchor: provisioning.initial_anchor,
                rollback_counter: 0,
                store: Some(store),
            }),
            Ok(Some(blob)) => {
                if blob.anchor < provisioning.initial_anchor || blob.mode != EvolutionMode::B {
                    return Err(ReceiverError::SecurityFault(SecurityFault::RollbackDetected {
                        persisted_anchor: blob.anchor,
                        persisted_counter: blob.rollback_counter,
                        memory_anchor: provisioning.initial_anchor,
                        memory_counter: 0,
                    }));
                }
                Ok(Self {
                    domain,
                    mode: ReceiverMode::B { evol_fn },
                    anchor: blob.anchor,
                    rollback_counter: blob.rollback_counter,
                    store: Some(store),
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "persisted receiver state blob is malformed, starting from provisioned defaults");
                Ok(Self {
                    domain,
                    mode: ReceiverMode::B { evol_fn },
                    anchor: provisioning.initial_anchor,
                    rollback_counter: 0,
                    store: Some(store),
                })
            }
        }
    }

    pub fn domain(&self) -> &DomainTag {
        &self.domain
    }

    pub fn mode(&self) -> EvolutionMode {
        match self.mode {
            ReceiverMode::A { .. } => EvolutionMode::A,
            ReceiverMode::B { .. } => EvolutionMode::B,
        }
    }

    /// Current anchor `t`, the minimum acceptable logical index.
    pub fn anchor(&self) -> u64 {
        self.anchor
    }

    pub fn rollback_counter(&self) -> u64 {
        self.rollback_counter
    }

    /// The inclusive window `[t, t+nu]` the validator should search.
    pub fn window(&self, nu: u32) -> RangeInclusive<u64> {
        self.anchor..=(self.anchor.saturating_add(nu as u64))
    }

    /// Derive `K_j` for `j >= t` by applying `KDF` forward from `K_t`.
    ///
    /// Pure: never mutates persistent state, never caches an
    /// intermediate seed (caching would let a compromise of later
    /// receiver state recover earlier fragments, defeating forward
    /// secrecy). Returns `None` for `j < t` or on Mode B, which has no
    /// seed to derive.
    pub fn derive_seed_at(&self, j: u64) -> Option<Vec<u8>> {
        let ReceiverMode::A { seed } = &self.mode else {
            return None;
        };
        if j < self.anchor {
            return None;
        }
        let mut current = seed.as_bytes().to_vec();
        for _ in 0..(j - self.anchor) {
            current = kdf::next(&current);
        }
        Some(current)
    }

    /// Evolution parameter `Z_j` for Mode B at index `j`, or `None` for
    /// Mode A (which has no public evolution function).
    pub fn evol_param_at(&self, j: u64) -> Option<Vec<u8>> {
        match &self.mode {
            ReceiverMode::A { .. } => None,
            ReceiverMode::B { evol_fn } => Some(evol_fn(j)),
        }
    }

    /// Atomically replace `(t, K_t)` with `(new_anchor, new_seed)` iff
    /// `new_anchor > t`.
    ///
    /// Two-phase commit: the durable blob is written (if a store is
    /// configured) *before* any in-memory field changes, so a failed
    /// persist leaves `self` completely untouched. There is nothing to
    /// roll back because nothing was mutated yet. Only after a
    /// successful persist is the old seed erased and the new state
    /// swapped in.
    pub fn advance(&mut self, new_anchor: u64, new_seed: Option<Vec<u8>>) -> Result<bool> {
        if new_anchor <= self.anchor {
            return Ok(false);
        }

        match (&self.mode, &new_seed) {
            (ReceiverMode::A { .. }, None) => {
                return Err(ReceiverError::Structural(
                    fragsync_core::error::StructuralError::MissingSeed,
                ));
            }
            (ReceiverMode::B { .. }, Some(_)) => {
                // Mode B carries no seed; a caller-supplied seed here is
                // simply ignored rather than treated as a hard error.
            }
            _ => {}
        }

        let new_counter = self.rollback_counter + 1;

        if let Some(store) = &self.store {
            let blob = PersistedBlob::new(
                self.mode(),
                new_anchor,
                new_seed.as_deref(),
                new_counter,
            );
            store.save(&blob)?;
            tracing::debug!(anchor = new_anchor, counter = new_counter, "persisted receiver state advance");
        }

        if let ReceiverMode::A { seed } = &mut self.mode {
            let mut old = std::mem::replace(seed, SecretSeed::new(new_seed.clone().unwrap_or_default()));
            secure_erase(old.as_bytes_mut());
        }
        self.anchor = new_anchor;
        self.rollback_counter = new_counter;
        Ok(true)
    }

    /// Re-read the durable blob and compare it against this state's
    /// in-memory anchor/counter. Detects an attacker (or operator
    /// mistake) restoring an older blob out from under a live process.
    /// Refuses (returns `Err`, leaves `self` untouched) whenever the
    /// on-disk generation is behind memory; a blob at or ahead of
    /// memory is accepted as a no-op (this process is always the sole
    /// writer, so "ahead" never legitimately happens, but is not itself
    /// a fault).
    pub fn verify_against_disk(&self) -> Result<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        if let Some(blob) = store.load()? {
            if blob.anchor < self.anchor || blob.rollback_counter < self.rollback_counter {
                return Err(ReceiverError::SecurityFault(SecurityFault::RollbackDetected {
                    persisted_anchor: blob.anchor,
                    persisted_counter: blob.rollback_counter,
                    memory_anchor: self.anchor,
                    memory_counter: self.rollback_counter,
                }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fragsync_core::types::ProvisioningConfig;
    use tempfile::tempdir;

    fn domain() -> DomainTag {
        DomainTag::new(vec![2u8; 16]).unwrap()
    }

    fn provisioning(domain: &DomainTag, mode: EvolutionMode) -> ProvisioningConfig {
        ProvisioningConfig {
            domain: domain.to_hex(),
            mode,
            fragment_bits: 256,
            window: 7,
            initial_anchor: 0,
        }
    }

    fn evol_fn(i: u64) -> Vec<u8> {
        i.to_be_bytes().to_vec()
    }

    #[test]
    fn window_is_inclusive_of_both_ends() {
        let s = ReceiverState::mode_a(domain(), vec![1u8; 32], 3).unwrap();
        let w = s.window(7);
        assert_eq!(*w.start(), 3);
        assert_eq!(*w.end(), 10);
    }

    #[test]
    fn derive_seed_at_anchor_matches_stored_seed() {
        let s = ReceiverState::mode_a(domain(), vec![9u8; 32], 0).unwrap();
        assert_eq!(s.derive_seed_at(0).unwrap(), vec![9u8; 32]);
    }

    #[test]
    fn derive_seed_at_before_anchor_is_none() {
        let s = ReceiverState::mode_a(domain(), vec![9u8; 32], 5).unwrap();
        assert!(s.derive_seed_at(4).is_none());
    }

    #[test]
    fn derive_seed_at_does_not_mutate_state() {
        let s = ReceiverState::mode_a(domain(), vec![9u8; 32], 0).unwrap();
        let _ = s.derive_seed_at(3);
        assert_eq!(s.anchor(), 0);
        assert_eq!(s.derive_seed_at(0).unwrap(), vec![9u8; 32]);
    }

    #[test]
    fn advance_rejects_non_monotonic_anchor() {
        let mut s = ReceiverState::mode_a(domain(), vec![9u8; 32], 5).unwrap();
        assert_eq!(s.advance(5, Some(vec![1u8; 32])).unwrap(), false);
        assert_eq!(s.advance(3, Some(vec![1u8; 32])).unwrap(), false);
        assert_eq!(s.anchor(), 5);
    }

    #[test]
    fn advance_updates_anchor_seed_and_counter() {
        let mut s = ReceiverState::mode_a(domain(), vec![9u8; 32], 0).unwrap();
        let next_seed = s.derive_seed_at(1).unwrap();
        assert!(s.advance(1, Some(next_seed.clone())).unwrap());
        assert_eq!(s.anchor(), 1);
        assert_eq!(s.rollback_counter(), 1);
        assert_eq!(s.derive_seed_at(1).unwrap(), next_seed);
    }

    #[test]
    fn mode_b_advance_ignores_seed_and_tracks_anchor_only() {
        let mut s = ReceiverState::mode_b(domain(), evol_fn, 0).unwrap();
        assert!(s.advance(2, None).unwrap());
        assert_eq!(s.anchor(), 2);
        assert_eq!(s.evol_param_at(2).unwrap(), evol_fn(2));
    }

    #[test]
    fn load_or_init_starts_fresh_when_blob_absent() {
        let dir = tempdir().unwrap();
        let d = domain();
        let prov = provisioning(&d, EvolutionMode::A);
        let path = dir.path().join("receiver.json");
        let s = ReceiverState::load_or_init_mode_a(&path, &prov, vec![4u8; 32]).unwrap();
        assert_eq!(s.anchor(), 0);
    }

    #[test]
    fn load_or_init_persists_across_advance_and_reload() {
        let dir = tempdir().unwrap();
        let d = domain();
        let prov = provisioning(&d, EvolutionMode::A);
        let path = dir.path().join("receiver.json");

        let mut s = ReceiverState::load_or_init_mode_a(&path, &prov, vec![4u8; 32]).unwrap();
        let next_seed = s.derive_seed_at(1).unwrap();
        s.advance(1, Some(next_seed)).unwrap();
        drop(s);

        let reloaded = ReceiverState::load_or_init_mode_a(&path, &prov, vec![4u8; 32]).unwrap();
        assert_eq!(reloaded.anchor(), 1);
        assert_eq!(reloaded.rollback_counter(), 1);
    }

    #[test]
    fn load_or_init_rejects_blob_behind_configured_floor() {
        let dir = tempdir().unwrap();
        let d = domain();
        let path = dir.path().join("receiver.json");
        let stale_prov = provisioning(&d, EvolutionMode::A);
        let ahead_prov = ProvisioningConfig {
            initial_anchor: 10,
            ..provisioning(&d, EvolutionMode::A)
        };

        // Persist a blob at anchor 0...
        let s = ReceiverState::load_or_init_mode_a(&path, &stale_prov, vec![4u8; 32]).unwrap();
        drop(s);

        // ...then load it again under a config whose floor is 10.
        let err = ReceiverState::load_or_init_mode_a(&path, &ahead_prov, vec![4u8; 32]).unwrap_err();
        assert!(matches!(err, ReceiverError::SecurityFault(_)));
    }

    #[test]
    fn verify_against_disk_detects_externally_restored_blob() {
        let dir = tempdir().unwrap();
        let d = domain();
        let prov = provisioning(&d, EvolutionMode::A);
        let path = dir.path().join("receiver.json");

        let mut s = ReceiverState::load_or_init_mode_a(&path, &prov, vec![4u8; 32]).unwrap();
        let seed1 = s.derive_seed_at(1).unwrap();
        s.advance(1, Some(seed1)).unwrap();

        let backup = std::fs::read(&path).unwrap();

        let seed2 = s.derive_seed_at(2).unwrap();
        s.advance(2, Some(seed2)).unwrap();
        assert!(s.verify_against_disk().is_ok());

        std::fs::write(&path, backup).unwrap();
        let err = s.verify_against_disk().unwrap_err();
        assert!(matches!(err, ReceiverError::SecurityFault(_)));
        // Refused, not silently accepted: in-memory state is unchanged.
        assert_eq!(s.anchor(), 2);
    }
}
