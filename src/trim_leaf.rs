//! Runtime state for a single leaf device's TRIM machinery, and for the
//! top-level group that owns a set of leaves and metaslabs.
//!
//! These mirror the `vdev_trim_*` fields the source keeps directly on
//! `vdev_t`: a trim mutex/cond-var pair for state transitions, an I/O
//! mutex/cond-var pair for the governor, and the small set of persisted
//! fields mirrored into memory by `trim_progress::LeafAttrStore`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::thread::JoinHandle;

use crate::trim_state::TrimState;
use crate::trim_types::Metaslab;

/// Depth of the txg pipeline the tentative-offset slots are keyed by. The
/// source uses a small fixed-size ring (`TXG_MASK`); a `HashMap` keyed
/// directly by txg number gives the same "a handful of in-flight txgs"
/// behavior without hard-coding the ring size, and slots are removed once
/// consumed by the progress store.
pub type TxgOffsets = HashMap<u64, u64>;

pub struct LeafRuntime {
    pub id: u64,
    pub path: String,
    pub top_group: u64,

    pub writeable: AtomicBool,
    pub detached: AtomicBool,
    pub top_removing: AtomicBool,
    pub exit_wanted: AtomicBool,

    /// Guards `state` plus the invariant "at most one manual worker".
    pub trim_lock: Mutex<TrimState>,
    pub trim_cv: Condvar,
    pub worker: Mutex<Option<JoinHandle<()>>>,

    pub last_offset: AtomicU64,
    pub rate: AtomicU64,
    pub partial: AtomicBool,
    pub secure: AtomicBool,
    pub action_time: AtomicI64,
    pub bytes_done: AtomicU64,
    pub bytes_est: AtomicU64,

    pub txg_offsets: Mutex<TxgOffsets>,

    /// `inflight[TrimType::index()]`.
    pub inflight: [AtomicU64; 2],
    pub io_lock: Mutex<()>,
    pub io_cv: Condvar,
}

impl LeafRuntime {
    pub fn new(id: u64, path: impl Into<String>, top_group: u64) -> Self {
        LeafRuntime {
            id,
            path: path.into(),
            top_group,
            writeable: AtomicBool::new(true),
            detached: AtomicBool::new(false),
            top_removing: AtomicBool::new(false),
            exit_wanted: AtomicBool::new(false),
            trim_lock: Mutex::new(TrimState::None),
            trim_cv: Condvar::new(),
            worker: Mutex::new(None),
            last_offset: AtomicU64::new(0),
            rate: AtomicU64::new(0),
            partial: AtomicBool::new(false),
            secure: AtomicBool::new(false),
            action_time: AtomicI64::new(0),
            bytes_done: AtomicU64::new(0),
            bytes_est: AtomicU64::new(0),
            txg_offsets: Mutex::new(HashMap::new()),
            inflight: [AtomicU64::new(0), AtomicU64::new(0)],
            io_lock: Mutex::new(()),
            io_cv: Condvar::new(),
        }
    }

    /// `vdev_trim_should_stop`.
    pub fn should_stop(&self) -> bool {
        self.exit_wanted.load(Ordering::SeqCst)
            || !self.writeable.load(Ordering::SeqCst)
            || self.detached.load(Ordering::SeqCst)
            || self.top_removing.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> TrimState {
        *self.trim_lock.lock().unwrap()
    }

    pub fn has_worker(&self) -> bool {
        self.worker.lock().unwrap().is_some()
    }

    pub fn total_inflight(&self) -> u64 {
        self.inflight[0].load(Ordering::SeqCst) + self.inflight[1].load(Ordering::SeqCst)
    }
}

/// A redundancy container (mirror/raidz/plain-leaf) owning an ordered set
/// of metaslabs and the ids of its child leaves.
pub struct TopGroupRuntime {
    pub id: u64,
    pub children: Vec<u64>,
    pub metaslabs: Mutex<Vec<Metaslab>>,
    pub removing: AtomicBool,
    pub writeable: AtomicBool,

    pub autotrim_lock: Mutex<()>,
    pub autotrim_cv: Condvar,
    pub autotrim_exit_wanted: AtomicBool,
    pub autotrim_worker: Mutex<Option<JoinHandle<()>>>,
}

impl TopGroupRuntime {
    pub fn new(id: u64, children: Vec<u64>, metaslabs: Vec<Metaslab>) -> Self {
        TopGroupRuntime {
            id,
            children,
            metaslabs: Mutex::new(metaslabs),
            removing: AtomicBool::new(false),
            writeable: AtomicBool::new(true),
            autotrim_lock: Mutex::new(()),
            autotrim_cv: Condvar::new(),
            autotrim_exit_wanted: AtomicBool::new(false),
            autotrim_worker: Mutex::new(None),
        }
    }

    pub fn has_autotrim_worker(&self) -> bool {
        self.autotrim_worker.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_stop_reflects_any_blocking_condition() {
        let leaf = LeafRuntime::new(1, "/dev/a", 9);
        assert!(!leaf.should_stop());
        leaf.exit_wanted.store(true, Ordering::SeqCst);
        assert!(leaf.should_stop());
        leaf.exit_wanted.store(false, Ordering::SeqCst);
        leaf.writeable.store(false, Ordering::SeqCst);
        assert!(leaf.should_stop());
    }

    #[test]
    fn total_inflight_sums_both_types() {
        let leaf = LeafRuntime::new(1, "/dev/a", 9);
        leaf.inflight[0].store(3, Ordering::SeqCst);
        leaf.inflight[1].store(4, Ordering::SeqCst);
        assert_eq!(leaf.total_inflight(), 7);
    }
}
