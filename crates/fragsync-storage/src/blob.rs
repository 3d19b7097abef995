//! Receiver state blob: wire format and atomic file persistence.
//!
//! The blob is the only durable artifact this protocol produces. Its
//! size is `O(1)` in the number of accepted fragments: it never grows,
//! no matter how many fragments a receiver has validated, because it
//! carries only the current anchor and seed, never a history.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use fragsync_core::types::{constants::BLOB_VERSION, EvolutionMode};

use crate::error::{Result, StorageError};

/// Durable receiver state, matching the wire JSON in the protocol's
/// external interfaces verbatim: `{ version, mode, anchor, seed,
/// rollback_counter }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedBlob {
    pub version: u32,
    pub mode: EvolutionMode,
    pub anchor: u64,
    /// Hex-encoded seed, Mode A only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub seed: Option<String>,
    #[serde(default)]
    pub rollback_counter: u64,
}

impl PersistedBlob {
    pub fn new(mode: EvolutionMode, anchor: u64, seed: Option<&[u8]>, rollback_counter: u64) -> Self {
        Self {
            version: BLOB_VERSION,
            mode,
            anchor,
            seed: seed.map(hex::encode),
            rollback_counter,
        }
    }

    pub fn seed_bytes(&self) -> Result<Option<Vec<u8>>> {
        self.seed
            .as_ref()
            .map(|s| hex::decode(s).map_err(|e| StorageError::Malformed(format!("invalid seed hex: {e}"))))
            .transpose()
    }
}

/// Atomic write-then-rename persistence for a single [`PersistedBlob`]
/// at a fixed filesystem path.
pub struct BlobStore {
    path: std::path::PathBuf,
}

impl BlobStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the blob at this store's path.
    ///
    /// Returns `Ok(None)` if no blob exists yet (fresh receiver). Returns
    /// `Err(StorageError::Malformed)` on a corrupt file. The caller must
    /// treat this as non-fatal and retain whatever in-memory state it
    /// already has; this function never panics or deletes the offending
    /// file.
    pub fn load(&self) -> Result<Option<PersistedBlob>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&self.path)?;
        let blob: PersistedBlob = serde_json::from_slice(&raw)
            .map_err(|e| StorageError::Malformed(e.to_string()))?;
        Ok(Some(blob))
    }

    /// Persist `blob` atomically: write to a sibling temp file, flush,
    /// fsync, then rename over the target. A crash at any point before
    /// the rename leaves the previous blob (or no blob) intact; a crash
    /// after the rename leaves the new blob intact. There is no
    /// intermediate state an observer can read.
    pub fn save(&self, blob: &PersistedBlob) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(blob)?;

        let tmp_path = tmp_path_for(&self.path);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&bytes)?;
            file.flush()?;
            file.sync_all()?;
        }

        let result = fs::rename(&tmp_path, &self.path);
        if result.is_err() {
            let _ = fs::remove_file(&tmp_path);
        }
        result?;
        tracing::debug!(anchor = blob.anchor, path = %self.path.display(), "persisted blob committed");
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    std::path::PathBuf::from(tmp)
}
