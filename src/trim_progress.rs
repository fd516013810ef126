//! Progress Store (C1): durable per-leaf TRIM attributes.
//!
//! The real system persists these six keys in the leaf's on-disk attribute
//! store ("leaf ZAP") inside a sync task bound to a txg. We don't have a
//! txg-aware object store here, so the sync-task boundary is modeled as an
//! explicit `commit()` call the governor makes at the point the source
//! would register `dsl_sync_task_nowait` — the write itself is still atomic
//! (write-temp, fsync, rename) the same way `metadata_tx.rs` and `disk.rs`
//! persist their own on-disk state.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::trim_state::TrimState;

/// Sentinel meaning "reset to default on next activation", matching the
/// source's `U64_MAX`. Only ever appears transiently in runtime memory; it
/// is never the value actually persisted (persistence maps it back to 0).
pub const RESET_SENTINEL: u64 = u64::MAX;

/// The six persisted attributes for a single leaf, as specified in
/// SPEC_FULL.md section 3.2.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LeafTrimAttrs {
    pub last_offset: u64,
    pub rate: u64,
    pub partial: bool,
    pub secure: bool,
    pub state: TrimState,
    pub action_time: i64,
}

impl Default for LeafTrimAttrs {
    fn default() -> Self {
        LeafTrimAttrs {
            last_offset: 0,
            rate: 0,
            partial: false,
            secure: false,
            state: TrimState::None,
            action_time: 0,
        }
    }
}

/// Durable per-leaf key-value store standing in for the leaf ZAP.
///
/// One JSON file per leaf under `<pool_dir>/trim/<leaf_id>.json`, written
/// atomically (temp file + rename), the same convention `Disk::save` and
/// `MetadataTransaction::write_root` use elsewhere in this crate.
pub struct LeafAttrStore {
    dir: PathBuf,
}

impl LeafAttrStore {
    pub fn new(pool_dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = pool_dir.into().join("trim");
        fs::create_dir_all(&dir).context("failed to create trim attribute directory")?;
        Ok(LeafAttrStore { dir })
    }

    fn path_for(&self, leaf_id: u64) -> PathBuf {
        self.dir.join(format!("{leaf_id:016x}.json"))
    }

    /// `zap_lookup` equivalent: missing file/keys map to defaults, never an
    /// error (the `ZapMissing` policy in the error table).
    pub fn load(&self, leaf_id: u64) -> Result<LeafTrimAttrs> {
        let path = self.path_for(leaf_id);
        if !path.exists() {
            return Ok(LeafTrimAttrs::default());
        }
        let bytes = fs::read(&path).context("failed to read leaf trim attributes")?;
        serde_json::from_slice(&bytes).context("failed to parse leaf trim attributes")
    }

    /// `zap_update` equivalent: atomically replace the persisted attrs.
    /// This is the body the sync task runs once it fires.
    pub fn store(&self, leaf_id: u64, attrs: &LeafTrimAttrs) -> Result<()> {
        let path = self.path_for(leaf_id);
        let tmp = path.with_extension("json.tmp");
        let encoded = serde_json::to_vec(attrs).context("failed to serialize leaf trim attributes")?;
        fs::write(&tmp, encoded).context("failed to write tmp leaf trim attributes")?;
        fs::rename(&tmp, &path).context("failed to atomically persist leaf trim attributes")?;
        Ok(())
    }

    pub fn remove(&self, leaf_id: u64) -> Result<()> {
        let path = self.path_for(leaf_id);
        if path.exists() {
            fs::remove_file(&path).context("failed to remove leaf trim attributes")?;
        }
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Resolve `RESET_SENTINEL` the way the sync task does when writing a field
/// that carries the "unchanged"/"reset" dual encoding: sentinel persists as
/// the type's zero value.
pub fn resolve_sentinel_u64(v: u64) -> u64 {
    if v == RESET_SENTINEL {
        0
    } else {
        v
    }
}
