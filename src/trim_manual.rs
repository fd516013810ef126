//! Manual TRIM Worker (C4): one thread per leaf, walking every metaslab of
//! its top-level group in order and driving the leaf's state machine to
//! completion (or interruption).

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::trim_governor::{issue_range, Clock, GovernorError, TrimIoPort, TrimStatsSink};
use crate::trim_leaf::{LeafRuntime, TopGroupRuntime};
use crate::trim_progress::{LeafAttrStore, LeafTrimAttrs};
use crate::trim_state::TrimState;
use crate::trim_translate::{add_range, calculate_progress};
use crate::trim_types::{TrimArgs, TrimType};

/// Minimum block size a pool would otherwise enforce; used as the extent
/// floor override when Secure TRIM is requested (§4.4 step 4).
pub const SECURE_MIN_BLOCK_SIZE: u64 = 512;

pub struct ManualWorkerParams {
    pub extent_bytes_max: u64,
    pub extent_bytes_min: u64,
    pub queue_limit: u64,
}

/// Splits `[start, start+size)` into `extent_bytes_max`-sized chunks,
/// skipping (and reporting) any run shorter than `extent_bytes_min`.
/// Mirrors `vdev_trim_ranges`'s splitting rule exactly.
pub fn split_into_chunks(start: u64, size: u64, extent_bytes_max: u64, extent_bytes_min: u64) -> (Vec<(u64, u64)>, u64) {
    if extent_bytes_min != 0 && size < extent_bytes_min {
        return (Vec::new(), size);
    }
    let writes_required = (size - 1) / extent_bytes_max + 1;
    let mut chunks = Vec::with_capacity(writes_required as usize);
    for w in 0..writes_required {
        let offset = start + w * extent_bytes_max;
        let length = (size - w * extent_bytes_max).min(extent_bytes_max);
        chunks.push((offset, length));
    }
    (chunks, 0)
}

/// `schedule_progress`: the sync-task boundary that pulls the txg's
/// tentative offset (written by the governor's `issue_range`, and possibly
/// rewound by `on_complete` on a failed I/O) forward into the durable
/// `LastOffset`. Zeros the slot once consumed, matching the source's
/// per-txg rewind window.
fn schedule_progress(leaf: &LeafRuntime, top: &TopGroupRuntime, attrs: &LeafAttrStore, txg: u64, now_ms: i64) {
    if top.removing.load(Ordering::SeqCst) || leaf.detached.load(Ordering::SeqCst) {
        return;
    }

    let slot = {
        let mut offsets = leaf.txg_offsets.lock().unwrap();
        offsets.get_mut(&txg).map(|v| std::mem::replace(v, 0))
    };
    let Some(offset) = slot else { return };
    if offset != 0 {
        leaf.last_offset.store(offset, Ordering::SeqCst);
    }

    let snapshot = LeafTrimAttrs {
        last_offset: leaf.last_offset.load(Ordering::SeqCst),
        rate: leaf.rate.load(Ordering::SeqCst),
        partial: leaf.partial.load(Ordering::SeqCst),
        secure: leaf.secure.load(Ordering::SeqCst),
        state: TrimState::Active,
        action_time: now_ms,
    };
    let _ = attrs.store(leaf.id, &snapshot);
}

/// Run one manual TRIM pass to completion or interruption. Intended to be
/// the body of the leaf's dedicated worker thread; also directly callable
/// from tests without spawning a thread.
#[allow(clippy::too_many_arguments)]
pub fn run_manual_pass(
    leaf: &Arc<LeafRuntime>,
    top: &Arc<TopGroupRuntime>,
    params: &ManualWorkerParams,
    attrs: &LeafAttrStore,
    port: &dyn TrimIoPort,
    stats: &Arc<dyn TrimStatsSink>,
    clock: &dyn Clock,
) -> Result<(), GovernorError> {
    let secure = leaf.secure.load(Ordering::SeqCst);
    let extent_bytes_min = if secure { SECURE_MIN_BLOCK_SIZE } else { params.extent_bytes_min };
    let mut ta = TrimArgs::new(TrimType::Manual, 0, params.extent_bytes_max, extent_bytes_min);
    ta.flags.secure = secure;
    ta.start_time_ms = clock.now_ms();

    let metaslab_count = top.metaslabs.lock().unwrap().len();
    let mut skipped_bytes = 0u64;
    let txg = leaf.id.wrapping_add(1); // one logical txg per pass in this model

    for idx in 0..metaslab_count {
        if leaf.detached.load(Ordering::SeqCst) {
            break;
        }

        let last_offset = leaf.last_offset.load(Ordering::SeqCst);
        let partial = leaf.partial.load(Ordering::SeqCst);

        let ranges_to_issue = {
            let mut metaslabs = top.metaslabs.lock().unwrap();
            let msp = &mut metaslabs[idx];
            msp.disable();

            if !msp.has_space_map && partial {
                msp.enable(false);
                continue;
            }
            msp.loaded = true;

            let mut tree = Vec::new();
            msp.ms_allocatable.walk(|start, size| {
                if let Some(seg) = add_range(TrimType::Manual, last_offset, start, size) {
                    tree.push((seg.start, seg.len()));
                }
            });
            msp.ms_trim.vacate();
            tree
        };

        let mut issued_any = false;
        let mut error = None;
        for (start, size) in ranges_to_issue {
            let (chunks, skipped) = split_into_chunks(start, size, params.extent_bytes_max, extent_bytes_min);
            skipped_bytes += skipped;
            for (offset, length) in chunks {
                match issue_range(leaf, &mut ta, clock, port, stats, offset, length, params.queue_limit, txg) {
                    Ok(()) => issued_any = true,
                    Err(e) => {
                        error = Some(e);
                        break;
                    }
                }
            }
            if error.is_some() {
                break;
            }
        }

        top.metaslabs.lock().unwrap()[idx].enable(issued_any);

        if let Some(e) = error {
            flush_inflight(leaf);
            schedule_progress(leaf, top, attrs, txg, clock.now_ms() as i64);
            return Err(e);
        }

        schedule_progress(leaf, top, attrs, txg, clock.now_ms() as i64);
    }

    flush_inflight(leaf);
    schedule_progress(leaf, top, attrs, txg, clock.now_ms() as i64);

    let progress = calculate_progress(&top.metaslabs.lock().unwrap(), leaf.last_offset.load(Ordering::SeqCst));
    leaf.bytes_done.store(progress.bytes_done, Ordering::SeqCst);
    leaf.bytes_est.store(progress.bytes_est, Ordering::SeqCst);

    if skipped_bytes > 0 {
        stats.record_skipped(TrimType::Manual, skipped_bytes);
    }
    Ok(())
}

fn flush_inflight(leaf: &Arc<LeafRuntime>) {
    let mut guard = leaf.io_lock.lock().unwrap();
    while leaf.inflight[TrimType::Manual.index()].load(Ordering::SeqCst) > 0 {
        guard = leaf.io_cv.wait(guard).unwrap();
    }
}
