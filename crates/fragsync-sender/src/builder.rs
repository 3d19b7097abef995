//! `FragmentBuilder`: the sender-side half of the protocol.
//!
//! Builds successive fragments `F_0, F_1, ...` and advances the
//! evolution state between them. Mode A carries a secret seed that is
//! replaced (and the old value securely erased) on every `advance`;
//! Mode B carries no secret at all, only a pointer to a pure function
//! of the logical index that both endpoints can recompute independently.

use serde::{Deserialize, Serialize};

use fragsync_core::types::{constants, DomainTag, EvolFn, EvolutionMode, SecretSeed};
use fragsync_crypto::{compute_fragment, kdf, secure_erase};

use crate::error::{Result, SenderError};

/// Builds fragments for one evolution mode and advances between them.
///
/// Mode A holds `seed: Some(_)`, `evol_fn: None`. Mode B holds the
/// reverse. The two are mutually exclusive by construction: only the
/// `mode_a`/`mode_b` constructors can produce a `FragmentBuilder`.
pub struct FragmentBuilder {
    domain: DomainTag,
    mode: EvolutionMode,
    fragment_bits: u32,
    seed: Option<SecretSeed>,
    evol_fn: Option<EvolFn>,
    index: u64,
}

impl FragmentBuilder {
    /// Construct a Mode A builder from a freshly provisioned secret seed.
    pub fn mode_a(domain: DomainTag, seed: Vec<u8>, fragment_bits: u32, initial_index: u64) -> Result<Self> {
        if seed.len() < constants::MIN_SEED_LEN {
            return Err(SenderError::Config(fragsync_core::error::ConfigError::SeedTooShort {
                min: constants::MIN_SEED_LEN,
                got: seed.len(),
            }));
        }
        validate_fragment_bits(fragment_bits)?;
        Ok(Self {
            domain,
            mode: EvolutionMode::A,
            fragment_bits,
            seed: Some(SecretSeed::new(seed)),
            evol_fn: None,
            index: initial_index,
        })
    }

    /// Construct a Mode B builder from a public evolution function.
    pub fn mode_b(domain: DomainTag, evol_fn: EvolFn, fragment_bits: u32, initial_index: u64) -> Result<Self> {
        validate_fragment_bits(fragment_bits)?;
        Ok(Self {
            domain,
            mode: EvolutionMode::B,
            fragment_bits,
            seed: None,
            evol_fn: Some(evol_fn),
            index: initial_index,
        })
    }

    pub fn mode(&self) -> EvolutionMode {
        self.mode
    }

    /// The index `i` of the fragment that the next `build` call will
    /// produce.
    pub fn current_index(&self) -> u64 {
        self.index
    }

    /// Build the fragment for the current index over `content`.
    ///
    /// `content_is_prepared` signals whether `content` already is the
    /// protocol's content representation `C := R(S)`. When `false`, this
    /// applies `R` as a collision-resistant hash of `content` first; the
    /// identity representation is obtained by passing `true` with
    /// pre-hashed (or inherently fixed-length, opaque) content.
    pub fn build(&self, content: &[u8], content_is_prepared: bool) -> Result<Vec<u8>> {
        let represented = represent(content, content_is_prepared);
        let evolution_param = self.evolution_param()?;

        let key = self.seed.as_ref().map(|s| s.as_bytes());
        let fragment = compute_fragment(
            self.domain.as_bytes(),
            &represented,
            &evolution_param,
            self.fragment_bits,
            key,
        )?;
        Ok(fragment)
    }

    /// Advance to the next index, replacing the Mode A seed (if any)
    /// with `KDF(seed)` and securely erasing the superseded value. A
    /// no-op on the seed for Mode B, which carries none.
    pub fn advance(&mut self) {
        if let Some(mut seed) = self.seed.take() {
            let next_bytes = kdf::next(seed.as_bytes());
            secure_erase(seed.as_bytes_mut());
            self.seed = Some(SecretSeed::new(next_bytes));
        }
        self.index += 1;
        tracing::debug!(index = self.index, mode = %self.mode, "sender state advanced");
    }

    fn evolution_param(&self) -> Result<Vec<u8>> {
        match self.mode {
            EvolutionMode::A => self
                .seed
                .as_ref()
                .map(|s| s.as_bytes().to_vec())
                .ok_or_else(|| SenderError::Config(fragsync_core::error::ConfigError::MissingSeed)),
            EvolutionMode::B => {
                let f = self
                    .evol_fn
                    .ok_or_else(|| SenderError::Config(fragsync_core::error::ConfigError::MissingEvolFn))?;
                Ok(f(self.index))
            }
        }
    }

    /// Snapshot the builder's non-secret-exempt state for persistence.
    ///
    /// Mode A snapshots include the current seed hex-encoded: the
    /// snapshot itself must then be stored with the same care as any
    /// other secret. Mode B snapshots never carry key material, since
    /// there is none to carry, but the evolution function pointer is
    /// never serializable either way and must be re-supplied by the
    /// caller on restore.
    pub fn snapshot(&self) -> BuilderSnapshot {
        BuilderSnapshot {
            domain_hex: self.domain.to_hex(),
            mode: self.mode,
            fragment_bits: self.fragment_bits,
            seed_hex: self.seed.as_ref().map(|s| hex::encode(s.as_bytes())),
            index: self.index,
        }
    }

    /// Restore a Mode A builder from a snapshot produced by `snapshot`.
    pub fn restore_mode_a(snapshot: &BuilderSnapshot) -> Result<Self> {
        if snapshot.mode != EvolutionMode::A {
            return Err(SenderError::MalformedSnapshot("snapshot is not Mode A".into()));
        }
        let domain = DomainTag::from_hex(&snapshot.domain_hex)?;
        let seed_hex = snapshot
            .seed_hex
            .as_ref()
            .ok_or_else(|| SenderError::MalformedSnapshot("Mode A snapshot missing seed".into()))?;
        let seed = hex::decode(seed_hex)
            .map_err(|e| SenderError::MalformedSnapshot(format!("invalid seed hex: {e}")))?;
        Self::mode_a(domain, seed, snapshot.fragment_bits, snapshot.index)
    }

    /// Restore a Mode B builder from a snapshot, re-supplying the
    /// evolution function the snapshot could not carry.
    pub fn restore_mode_b(snapshot: &BuilderSnapshot, evol_fn: EvolFn) -> Result<Self> {
        if snapshot.mode != EvolutionMode::B {
            return Err(SenderError::MalformedSnapshot("snapshot is not Mode B".into()));
        }
        let domain = DomainTag::from_hex(&snapshot.domain_hex)?;
        Self::mode_b(domain, evol_fn, snapshot.fragment_bits, snapshot.index)
    }
}

/// Serializable snapshot of a [`FragmentBuilder`]'s state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuilderSnapshot {
    pub domain_hex: String,
    pub mode: EvolutionMode,
    pub fragment_bits: u32,
    pub seed_hex: Option<String>,
    pub index: u64,
}

impl BuilderSnapshot {
    /// Serialize to an opaque byte blob (`serde_json` under the hood) for
    /// callers that want to persist or transmit crash-safety state
    /// without depending on this crate's struct directly.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Restore a snapshot from a blob produced by [`Self::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

fn represent(content: &[u8], content_is_prepared: bool) -> Vec<u8> {
    if content_is_prepared {
        content.to_vec()
    } else {
        blake3::hash(content).as_bytes().to_vec()
    }
}

fn validate_fragment_bits(fragment_bits: u32) -> Result<()> {
    if fragment_bits < constants::MIN_FRAGMENT_BITS || fragment_bits % 8 != 0 {
        return Err(SenderError::Config(fragsync_core::error::ConfigError::InvalidFragmentLength {
            min: constants::MIN_FRAGMENT_BITS,
            got: fragment_bits,
        }));
    }
    Ok(())
}
