//! I/O Governor (C3): per-leaf rate and queue-depth gating around the
//! (external) TRIM issue path.
//!
//! The actual block-I/O issue path (`zio_trim` in the source) is an
//! explicit external collaborator per SPEC_FULL.md section 1 and is
//! modeled here as the [`TrimIoPort`] trait so the governor's gating logic
//! is exercised independent of any real device.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use crate::trim_leaf::LeafRuntime;
use crate::trim_types::{TrimArgs, TrimType};

/// Injectable wall clock so rate-limit math (and its tests) don't depend on
/// `Instant::now()`.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

pub struct SystemClock {
    start: std::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock { start: std::time::Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// A clock tests can advance deterministically without sleeping.
pub struct FakeClock {
    now_ms: std::sync::atomic::AtomicU64,
}

impl FakeClock {
    pub fn new() -> Self {
        FakeClock { now_ms: std::sync::atomic::AtomicU64::new(0) }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}

/// One physical chunk submitted to the issue path.
#[derive(Debug, Clone)]
pub struct TrimIoRequest {
    pub leaf_id: u64,
    pub start: u64,
    pub size: u64,
    pub trim_type: TrimType,
    pub secure: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrimIoOutcome {
    Success,
    /// The device was unavailable (`NoSuchDevice` in the error table).
    DeviceUnavailable,
    Error,
}

/// Stand-in for `zio_trim`: submits one physical TRIM and must eventually
/// invoke `on_complete` exactly once, possibly from another thread.
pub trait TrimIoPort: Send + Sync {
    fn submit(&self, req: TrimIoRequest, on_complete: Box<dyn FnOnce(TrimIoOutcome) + Send>);
}

/// Default port for contexts with no real block device backing the pool:
/// completes every request successfully with the small fixed latency the
/// source's own I/O scheduler stub simulates.
pub struct ImmediateTrimPort;

impl TrimIoPort for ImmediateTrimPort {
    fn submit(&self, _req: TrimIoRequest, on_complete: Box<dyn FnOnce(TrimIoOutcome) + Send>) {
        std::thread::sleep(Duration::from_micros(100));
        on_complete(TrimIoOutcome::Success);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernorError {
    /// Matches `should_stop` observed before or during the gate wait.
    Interrupted,
}

/// Stats a completion accrues onto, standing in for `spa_iostats_trim_add`
/// and `vdev_stat.vs_trim_errors`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrimIoStats {
    pub ok_count: u64,
    pub ok_bytes: u64,
    pub failed_count: u64,
    pub failed_bytes: u64,
}

/// The governor's accounting sink: a trait object so the manual/auto
/// workers can share one implementation without depending on a concrete
/// `Metrics` type, the same decoupling `IoScheduler::set_result_handler`
/// gives the rest of this crate's I/O path.
pub trait TrimStatsSink: Send + Sync {
    fn record(&self, trim_type: TrimType, stats: TrimIoStats);

    /// A contiguous run shorter than `extent_bytes_min` was left untrimmed
    /// rather than issued, standing in for `vs_trim_bytes_skipped`.
    fn record_skipped(&self, trim_type: TrimType, bytes: u64);
}

pub struct NullStatsSink;
impl TrimStatsSink for NullStatsSink {
    fn record(&self, _trim_type: TrimType, _stats: TrimIoStats) {}
    fn record_skipped(&self, _trim_type: TrimType, _bytes: u64) {}
}

/// Governs and issues one physical chunk, implementing SPEC_FULL.md 4.3
/// steps 1-11. Returns `Interrupted` if `should_stop` fires before the I/O
/// is handed to the port; otherwise the I/O is in flight and will resolve
/// through `on_done_manual`/`on_done_auto` asynchronously.
pub fn issue_range(
    leaf: &Arc<LeafRuntime>,
    ta: &mut TrimArgs,
    clock: &dyn Clock,
    port: &dyn TrimIoPort,
    stats: &Arc<dyn TrimStatsSink>,
    start: u64,
    size: u64,
    queue_limit: u64,
    txg: u64,
) -> Result<(), GovernorError> {
    {
        let mut guard = leaf.io_lock.lock().unwrap();
        // Rate gate.
        loop {
            let rate = leaf.rate.load(Ordering::SeqCst);
            if rate == 0 || leaf.should_stop() || ta.measured_rate(clock.now_ms()) <= rate {
                break;
            }
            let (g, _) = leaf.io_cv.wait_timeout(guard, Duration::from_millis(10)).unwrap();
            guard = g;
        }

        ta.bytes_done += size;

        // Queue gate.
        while leaf.total_inflight() >= queue_limit {
            guard = leaf.io_cv.wait(guard).unwrap();
        }
        leaf.inflight[ta.trim_type.index()].fetch_add(1, Ordering::SeqCst);
    }

    if ta.trim_type == TrimType::Manual {
        let mut offsets = leaf.txg_offsets.lock().unwrap();
        if !offsets.contains_key(&txg) {
            offsets.insert(txg, 0);
        }
    }

    if leaf.should_stop() {
        leaf.inflight[ta.trim_type.index()].fetch_sub(1, Ordering::SeqCst);
        leaf.io_cv.notify_all();
        return Err(GovernorError::Interrupted);
    }

    if ta.trim_type == TrimType::Manual {
        leaf.txg_offsets.lock().unwrap().insert(txg, start + size);
    }

    let leaf_for_cb = Arc::clone(leaf);
    let trim_type = ta.trim_type;
    let orig_size = size;
    let stats_for_cb = Arc::clone(stats);
    port.submit(
        TrimIoRequest { leaf_id: leaf.id, start, size, trim_type, secure: ta.flags.secure },
        Box::new(move |outcome| on_complete(&leaf_for_cb, trim_type, txg, start, orig_size, outcome, &*stats_for_cb)),
    );

    Ok(())
}

/// `on_done_manual`/`on_done_auto` fused into one function parameterized on
/// trim type, since the only behavioral difference is the rewind.
fn on_complete(
    leaf: &Arc<LeafRuntime>,
    trim_type: TrimType,
    txg: u64,
    offset: u64,
    orig_size: u64,
    outcome: TrimIoOutcome,
    stats: &dyn TrimStatsSink,
) {
    let _guard = leaf.io_lock.lock().unwrap();

    if trim_type == TrimType::Manual && outcome == TrimIoOutcome::DeviceUnavailable && !leaf.writeable.load(Ordering::SeqCst) {
        let mut offsets = leaf.txg_offsets.lock().unwrap();
        if let Some(slot) = offsets.get_mut(&txg) {
            *slot = (*slot).min(offset);
        }
    } else {
        match outcome {
            TrimIoOutcome::Success => stats.record(trim_type, TrimIoStats { ok_count: 1, ok_bytes: orig_size, ..Default::default() }),
            _ => stats.record(trim_type, TrimIoStats { failed_count: 1, failed_bytes: orig_size, ..Default::default() }),
        }
    }

    assert!(leaf.inflight[trim_type.index()].load(Ordering::SeqCst) > 0);
    leaf.inflight[trim_type.index()].fetch_sub(1, Ordering::SeqCst);
    leaf.trim_cv.notify_all();
    leaf.io_cv.notify_all();
}
