//! Autotrim Worker (C5): one thread per top-level group, continuously
//! sweeping metaslabs that have accumulated freed space since the last
//! pass. Unlike manual TRIM, progress here is never persisted — a crash
//! or restart simply means the next pass re-discovers whatever is still
//! in `ms_trim`.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::trim_governor::{issue_range, Clock, TrimIoPort, TrimStatsSink};
use crate::trim_leaf::{LeafRuntime, TopGroupRuntime};
use crate::trim_translate::add_range;
use crate::trim_types::{TrimArgs, TrimType};

pub struct AutoWorkerParams {
    pub extent_bytes_max: u64,
    pub extent_bytes_min: u64,
    pub queue_limit: u64,
    /// `txg_batch`: how many metaslabs the shift/stride selection spreads a
    /// full sweep across.
    pub txgs_per_trim: u64,
}

/// Selects the metaslabs eligible this pass: `index % txgs_per_trim == phase`.
/// Mirrors the shift/stride scheme `vdev_autotrim_thread` uses to avoid
/// pulling every metaslab's range tree into memory on the same txg.
pub fn select_phase(metaslab_count: usize, txgs_per_trim: u64, phase: u64) -> Vec<usize> {
    if txgs_per_trim == 0 {
        return (0..metaslab_count).collect();
    }
    (0..metaslab_count).filter(|&i| (i as u64) % txgs_per_trim == phase).collect()
}

/// Run one autotrim phase over a top-level group's eligible metaslabs,
/// fanning work out to each non-removing child leaf that doesn't currently
/// have a manual worker attached (manual trim owns the leaf while active).
#[allow(clippy::too_many_arguments)]
pub fn run_auto_phase(
    top: &Arc<TopGroupRuntime>,
    children: &[Arc<LeafRuntime>],
    params: &AutoWorkerParams,
    port: &dyn TrimIoPort,
    stats: &Arc<dyn TrimStatsSink>,
    clock: &dyn Clock,
    phase: u64,
    txg: u64,
) {
    let metaslab_count = top.metaslabs.lock().unwrap().len();
    let eligible = select_phase(metaslab_count, params.txgs_per_trim, phase);

    for idx in eligible {
        if top.autotrim_exit_wanted.load(Ordering::SeqCst) || !top.writeable.load(Ordering::SeqCst) || top.removing.load(Ordering::SeqCst) {
            break;
        }

        let mut issued_trim = false;
        let mut swapped = crate::trim_types::RangeTree::new();
        {
            let mut metaslabs = top.metaslabs.lock().unwrap();
            let msp = &mut metaslabs[idx];
            if msp.ms_trim.is_empty() {
                continue;
            }
            msp.disable();
            msp.ms_trim.swap(&mut swapped);
        }

        for leaf in children {
            if leaf.has_worker() {
                // A manual pass owns this leaf; autotrim yields to it.
                continue;
            }
            if leaf.should_stop() {
                continue;
            }

            let mut ta = TrimArgs::new(TrimType::Auto, idx, params.extent_bytes_max, params.extent_bytes_min);
            ta.start_time_ms = clock.now_ms();

            let mut segs = Vec::new();
            swapped.walk(|start, size| {
                if let Some(seg) = add_range(TrimType::Auto, 0, start, size) {
                    segs.push((seg.start, seg.len()));
                }
            });

            for (start, size) in segs {
                let (chunks, skipped) = crate::trim_manual::split_into_chunks(start, size, params.extent_bytes_max, params.extent_bytes_min);
                if skipped > 0 {
                    stats.record_skipped(TrimType::Auto, skipped);
                }
                for (offset, length) in chunks {
                    if issue_range(leaf, &mut ta, clock, port, stats, offset, length, params.queue_limit, txg).is_ok() {
                        issued_trim = true;
                    }
                }
            }
        }

        {
            let mut metaslabs = top.metaslabs.lock().unwrap();
            let msp = &mut metaslabs[idx];
            msp.enable(issued_trim);
        }
    }

    // Shutdown drain: wait for every child's autotrim-inflight counter to
    // reach zero before the caller tears this worker down.
    for leaf in children {
        let mut guard = leaf.io_lock.lock().unwrap();
        while leaf.inflight[TrimType::Auto.index()].load(Ordering::SeqCst) > 0 {
            guard = leaf.io_cv.wait(guard).unwrap();
        }
    }
}

/// If autotrim has just been disabled, any residual `ms_trim` contents are
/// abandoned outright (`range_tree_vacate` with a `NULL` callback in the
/// source) rather than folded back into `ms_allocatable` — they aren't
/// worth remembering across a property flip, and `ms_allocatable` is
/// read-only to this subsystem.
pub fn vacate_residual_trim(top: &Arc<TopGroupRuntime>) {
    let mut metaslabs = top.metaslabs.lock().unwrap();
    for msp in metaslabs.iter_mut() {
        msp.ms_trim.vacate();
    }
}
