//! `Validator`: windowed recomputation and strict-equality matching.
//!
//! Given a received fragment, a [`ReceiverState`], and a payload, the
//! validator recomputes candidate fragments for every index in
//! `[t, t+nu]` and compares each against what arrived. A match commits
//! the receiver forward; exhausting the window without a match is a
//! silent reject: the caller learns only that nothing matched, never
//! why.

use fragsync_core::error::{ConfigError, StructuralError};
use fragsync_core::types::{constants, EvolutionMode};
use fragsync_crypto::{compute_fragment, constant_time_equal, kdf};

use crate::error::{ReceiverError, Result};
use crate::state::ReceiverState;

/// Which window-traversal discipline a validator uses. A deployment
/// policy fixed at construction, not a per-call flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraversalPolicy {
    /// Return as soon as a match is found. Efficient; leaks the match
    /// position through timing.
    EarlyStop,
    /// Always walk the full window and report the first match (if any)
    /// only at the end. Side-channel hardened at the cost of always
    /// doing `nu + 1` comparisons.
    ConstantTime,
}

/// Outcome of a validation attempt. `Reject` is deliberately silent: it
/// carries nothing beyond its own occurrence.
#[derive(Debug)]
pub enum ValidationOutcome {
    Accept(u64),
    Reject,
    Error(ReceiverError),
}

/// Internal validation counters. Exposed read-only; never used to
/// distinguish reject reasons from outside the validator, which would
/// defeat the point of a silent reject.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorStats {
    pub total_validations: u64,
    pub accepts: u64,
    pub rejects: u64,
    pub comparisons: u64,
}

struct AtomicStats {
    total_validations: std::sync::atomic::AtomicU64,
    accepts: std::sync::atomic::AtomicU64,
    rejects: std::sync::atomic::AtomicU64,
    comparisons: std::sync::atomic::AtomicU64,
}

impl Default for AtomicStats {
    fn default() -> Self {
        Self {
            total_validations: std::sync::atomic::AtomicU64::new(0),
            accepts: std::sync::atomic::AtomicU64::new(0),
            rejects: std::sync::atomic::AtomicU64::new(0),
            comparisons: std::sync::atomic::AtomicU64::new(0),
        }
    }
}

/// Recomputes candidate fragments over a bounded forward window and
/// checks them against a received fragment under strict equality.
pub struct Validator {
    fragment_bits: u32,
    window: u32,
    policy: TraversalPolicy,
    stats: AtomicStats,
}

impl Validator {
    /// `fragment_bits` and `window` must match the sender's
    /// provisioning exactly. Keying follows the evolution mode
    /// automatically: Mode A always keys the PRF with the recomputed
    /// seed (matching `FragmentBuilder`'s own behavior), Mode B never
    /// does, since it carries no secret to key with.
    pub fn new(fragment_bits: u32, window: u32, policy: TraversalPolicy) -> Result<Self> {
        if fragment_bits < constants::MIN_FRAGMENT_BITS || fragment_bits % 8 != 0 {
            return Err(ReceiverError::Config(ConfigError::InvalidFragmentLength {
                min: constants::MIN_FRAGMENT_BITS,
                got: fragment_bits,
            }));
        }
        Ok(Self {
            fragment_bits,
            window,
            policy,
            stats: AtomicStats::default(),
        })
    }

    pub fn window_width(&self) -> u32 {
        self.window
    }

    /// Validate using this validator's configured [`TraversalPolicy`].
    pub fn validate(
        &self,
        fragment_rx: &[u8],
        state: &ReceiverState,
        content: &[u8],
        content_is_prepared: bool,
    ) -> ValidationOutcome {
        match self.policy {
            TraversalPolicy::EarlyStop => self.validate_early_stop(fragment_rx, state, content, content_is_prepared),
            TraversalPolicy::ConstantTime => {
                self.validate_constant_time(fragment_rx, state, content, content_is_prepared)
            }
        }
    }

    /// Return at the first matching index. Leaks match position via
    /// timing; appropriate when the deployment does not need the
    /// side-channel hardening of [`Self::validate_constant_time`].
    pub fn validate_early_stop(
        &self,
        fragment_rx: &[u8],
        state: &ReceiverState,
        content: &[u8],
        content_is_prepared: bool,
    ) -> ValidationOutcome {
        use std::sync::atomic::Ordering;
        self.stats.total_validations.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.check_length(fragment_rx) {
            return ValidationOutcome::Error(e);
        }
        let content_repr = represent(content, content_is_prepared);
        let candidates = match self.window_candidates(state) {
            Ok(c) => c,
            Err(e) => return ValidationOutcome::Error(e),
        };

        for (j, z, key) in candidates {
            self.stats.comparisons.fetch_add(1, Ordering::Relaxed);
            let computed = match compute_fragment(
                state.domain().as_bytes(),
                &content_repr,
                &z,
                self.fragment_bits,
                key.as_deref(),
            ) {
                Ok(f) => f,
                Err(e) => return ValidationOutcome::Error(ReceiverError::Crypto(e)),
            };
            if constant_time_equal(&computed, fragment_rx) {
                self.stats.accepts.fetch_add(1, Ordering::Relaxed);
                return ValidationOutcome::Accept(j);
            }
        }
        self.stats.rejects.fetch_add(1, Ordering::Relaxed);
        ValidationOutcome::Reject
    }

    /// Always walk the full window, regardless of where (or whether) a
    /// match occurs, recording only the earliest match index. The loop
    /// body performs the identical sequence of operations on every
    /// iteration; only the bookkeeping after the comparison depends on
    /// its result, never the iteration count or control flow.
    pub fn validate_constant_time(
        &self,
        fragment_rx: &[u8],
        state: &ReceiverState,
        content: &[u8],
        content_is_prepared: bool,
    ) -> ValidationOutcome {
        use std::sync::atomic::Ordering;
        self.stats.total_validations.fetch_add(1, Ordering::Relaxed);

        if let Err(e) = self.check_length(fragment_rx) {
            return ValidationOutcome::Error(e);
        }
        let content_repr = represent(content, content_is_prepared);
        let candidates = match self.window_candidates(state) {
            Ok(c) => c,
            Err(e) => return ValidationOutcome::Error(e),
        };

        let mut matched: Option<u64> = None;
        for (j, z, key) in candidates {
            self.stats.comparisons.fetch_add(1, Ordering::Relaxed);
            let computed = match compute_fragment(
                state.domain().as_bytes(),
                &content_repr,
                &z,
                self.fragment_bits,
                key.as_deref(),
            ) {
                Ok(f) => f,
                Err(e) => return ValidationOutcome::Error(ReceiverError::Crypto(e)),
            };
            let is_match = constant_time_equal(&computed, fragment_rx);
            if is_match && matched.is_none() {
                matched = Some(j);
            }
        }

        match matched {
            Some(j) => {
                self.stats.accepts.fetch_add(1, Ordering::Relaxed);
                ValidationOutcome::Accept(j)
            }
            None => {
                self.stats.rejects.fetch_add(1, Ordering::Relaxed);
                ValidationOutcome::Reject
            }
        }
    }

    /// Compose validation with [`ReceiverState::advance`]: on `ACCEPT`,
    /// commits the receiver forward to `j*+1`. If the persist step
    /// inside `advance` fails, the in-memory state is left untouched
    /// (by `advance`'s own two-phase discipline) and this returns
    /// `Error` rather than a stale `Accept`.
    pub fn validate_and_commit(
        &self,
        fragment_rx: &[u8],
        state: &mut ReceiverState,
        content: &[u8],
        content_is_prepared: bool,
    ) -> ValidationOutcome {
        let outcome = self.validate(fragment_rx, state, content, content_is_prepared);
        let ValidationOutcome::Accept(j) = outcome else {
            return outcome;
        };

        let new_seed = state.derive_seed_at(j + 1);
        match state.advance(j + 1, new_seed) {
            Ok(true) => ValidationOutcome::Accept(j),
            Ok(false) => ValidationOutcome::Error(ReceiverError::Structural(StructuralError::MalformedBlob(
                "commit-advance attempted a non-monotonic transition".into(),
            ))),
            Err(e) => ValidationOutcome::Error(e),
        }
    }

    pub fn stats(&self) -> ValidatorStats {
        use std::sync::atomic::Ordering;
        ValidatorStats {
            total_validations: self.stats.total_validations.load(Ordering::Relaxed),
            accepts: self.stats.accepts.load(Ordering::Relaxed),
            rejects: self.stats.rejects.load(Ordering::Relaxed),
            comparisons: self.stats.comparisons.load(Ordering::Relaxed),
        }
    }

    pub fn reset_stats(&self) {
        use std::sync::atomic::Ordering;
        self.stats.total_validations.store(0, Ordering::Relaxed);
        self.stats.accepts.store(0, Ordering::Relaxed);
        self.stats.rejects.store(0, Ordering::Relaxed);
        self.stats.comparisons.store(0, Ordering::Relaxed);
    }

    fn check_length(&self, fragment_rx: &[u8]) -> std::result::Result<(), ReceiverError> {
        let expected = (self.fragment_bits / 8) as usize;
        if fragment_rx.len() != expected {
            return Err(ReceiverError::Structural(StructuralError::FragmentLengthMismatch {
                expected,
                got: fragment_rx.len(),
            }));
        }
        Ok(())
    }

    /// Precompute `(index, evolution_param, prf_key)` triples for every
    /// `j` in the window, walking the Mode A seed chain forward once
    /// from `K_t` rather than re-deriving it per index.
    fn window_candidates(
        &self,
        state: &ReceiverState,
    ) -> std::result::Result<Vec<(u64, Vec<u8>, Option<Vec<u8>>)>, ReceiverError> {
        let window = state.window(self.window);
        let mut out = Vec::with_capacity(window.clone().count());

        match state.mode() {
            EvolutionMode::A => {
                let mut seed = state
                    .derive_seed_at(*window.start())
                    .ok_or(ReceiverError::Structural(StructuralError::MissingSeed))?;
                for j in window {
                    out.push((j, seed.clone(), Some(seed.clone())));
                    seed = kdf::next(&seed);
                }
            }
            EvolutionMode::B => {
                for j in window {
                    let z = state
                        .evol_param_at(j)
                        .ok_or(ReceiverError::Structural(StructuralError::MissingEvolFn))?;
                    out.push((j, z, None));
                }
            }
        }
        Ok(out)
    }
}

fn represent(content: &[u8], content_is_prepared: bool) -> Vec<u8> {
    if content_is_prepared {
        content.to_vec()
    } else {
        blake3::hash(content).as_bytes().to_vec()
    }
}
