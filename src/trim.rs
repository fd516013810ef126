//! Lifecycle Controller (C6): the public start/stop/restart surface for
//! manual and automatic TRIM, wiring together the progress store, I/O
//! governor, range translator, and worker modules around the state machine
//! `trim_state` describes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::{EventLog, LogEvent, LogLevel};
use crate::metrics::Metrics;
use crate::trim_auto::{run_auto_phase, vacate_residual_trim, AutoWorkerParams};
use crate::trim_governor::{Clock, ImmediateTrimPort, SystemClock, TrimIoPort, TrimIoStats, TrimStatsSink};
use crate::trim_leaf::{LeafRuntime, TopGroupRuntime};
use crate::trim_manual::{run_manual_pass, ManualWorkerParams};
use crate::trim_progress::{LeafAttrStore, LeafTrimAttrs};
use crate::trim_state::TrimState;
use crate::trim_translate::calculate_progress;
use crate::trim_types::TrimType;

#[derive(Debug, Error)]
pub enum TrimError {
    #[error("leaf {0} is not attached to this pool")]
    UnknownLeaf(u64),
    #[error("top-level group {0} is not attached to this pool")]
    UnknownTopGroup(u64),
    #[error("a manual trim is already active on leaf {0}")]
    AlreadyActive(u64),
    #[error("leaf {0} has no manual trim to stop")]
    NotActive(u64),
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

/// Runtime-tunable module parameters, the ambient equivalent of the
/// source's four `module_param` knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimConfig {
    pub extent_bytes_max: u64,
    pub extent_bytes_min: u64,
    pub queue_limit: u64,
    pub txg_batch: u64,
    pub autotrim_enabled: bool,
}

impl Default for TrimConfig {
    fn default() -> Self {
        TrimConfig {
            extent_bytes_max: 128 << 20,
            extent_bytes_min: 32 << 10,
            queue_limit: 10,
            txg_batch: 32,
            autotrim_enabled: false,
        }
    }
}

/// Replaces the source's `0`-means-unchanged / `U64_MAX`-means-reset
/// sentinel encoding on the start call: `None` leaves a setting alone on
/// resume, or resets it to default when starting a fresh run.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrimActivation {
    pub rate: Option<u64>,
    pub partial: Option<bool>,
    pub secure: Option<bool>,
}

/// Point-in-time view of a leaf's manual trim, for status reporting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TrimStatus {
    pub state: TrimState,
    pub last_offset: u64,
    pub rate: u64,
    pub partial: bool,
    pub secure: bool,
    pub bytes_done: u64,
    pub bytes_est: u64,
    pub action_time: i64,
}

/// Adapts the governor's stats sink onto the crate-wide `Metrics` struct.
pub struct MetricsTrimSink {
    metrics: Arc<Metrics>,
}

impl MetricsTrimSink {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        MetricsTrimSink { metrics }
    }
}

impl TrimStatsSink for MetricsTrimSink {
    fn record(&self, _trim_type: TrimType, stats: TrimIoStats) {
        self.metrics.trim_operations.fetch_add(stats.ok_count + stats.failed_count, Ordering::Relaxed);
        self.metrics.trim_bytes_reclaimed.fetch_add(stats.ok_bytes, Ordering::Relaxed);
        self.metrics.trim_errors.fetch_add(stats.failed_count, Ordering::Relaxed);
    }

    fn record_skipped(&self, _trim_type: TrimType, bytes: u64) {
        self.metrics.record_trim_skipped(bytes);
    }
}

/// Owns every leaf/top-group runtime attached to the pool and drives their
/// manual and automatic trim workers.
pub struct TrimCoordinator {
    config: Arc<Mutex<TrimConfig>>,
    attrs: Arc<LeafAttrStore>,
    leaves: Mutex<HashMap<u64, Arc<LeafRuntime>>>,
    top_groups: Mutex<HashMap<u64, Arc<TopGroupRuntime>>>,
    port: Arc<dyn TrimIoPort>,
    stats: Arc<dyn TrimStatsSink>,
    clock: Arc<dyn Clock>,
    events: Mutex<EventLog>,
    autotrim_txg: AtomicU64,
}

impl TrimCoordinator {
    pub fn new(pool_dir: impl Into<std::path::PathBuf>, config: TrimConfig, metrics: Arc<Metrics>) -> Result<Self> {
        Ok(TrimCoordinator {
            config: Arc::new(Mutex::new(config)),
            attrs: Arc::new(LeafAttrStore::new(pool_dir)?),
            leaves: Mutex::new(HashMap::new()),
            top_groups: Mutex::new(HashMap::new()),
            port: Arc::new(ImmediateTrimPort),
            stats: Arc::new(MetricsTrimSink::new(metrics)),
            clock: Arc::new(SystemClock::new()),
            events: Mutex::new(EventLog::new(1000, LogLevel::Info)),
            autotrim_txg: AtomicU64::new(0),
        })
    }

    /// Test/embedding hook: swap in fakes for the I/O port, stats sink, and
    /// clock instead of the production defaults `new` installs.
    pub fn with_collaborators(
        pool_dir: impl Into<std::path::PathBuf>,
        config: TrimConfig,
        port: Arc<dyn TrimIoPort>,
        stats: Arc<dyn TrimStatsSink>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Ok(TrimCoordinator {
            config: Arc::new(Mutex::new(config)),
            attrs: Arc::new(LeafAttrStore::new(pool_dir)?),
            leaves: Mutex::new(HashMap::new()),
            top_groups: Mutex::new(HashMap::new()),
            port,
            stats,
            clock,
            events: Mutex::new(EventLog::new(1000, LogLevel::Info)),
            autotrim_txg: AtomicU64::new(0),
        })
    }

    pub fn register_leaf(&self, leaf: Arc<LeafRuntime>) {
        self.leaves.lock().unwrap().insert(leaf.id, leaf);
    }

    pub fn register_top_group(&self, top: Arc<TopGroupRuntime>) {
        self.top_groups.lock().unwrap().insert(top.id, top);
    }

    fn get_leaf(&self, leaf_id: u64) -> Result<Arc<LeafRuntime>, TrimError> {
        self.leaves.lock().unwrap().get(&leaf_id).cloned().ok_or(TrimError::UnknownLeaf(leaf_id))
    }

    fn get_top_group(&self, top_id: u64) -> Result<Arc<TopGroupRuntime>, TrimError> {
        self.top_groups.lock().unwrap().get(&top_id).cloned().ok_or(TrimError::UnknownTopGroup(top_id))
    }

    fn children_of(&self, top: &TopGroupRuntime) -> Vec<Arc<LeafRuntime>> {
        let leaves = self.leaves.lock().unwrap();
        top.children.iter().filter_map(|id| leaves.get(id).cloned()).collect()
    }

    fn emit(&self, leaf_id: u64, message: impl Into<String>) {
        let event = LogEvent::new("trim", LogLevel::Info, message.into())
            .with_context(serde_json::json!({ "leaf_id": leaf_id }));
        log::info!("{}", event.to_text());
        self.events.lock().unwrap().log(event);
    }

    fn persist(&self, leaf: &LeafRuntime, state: TrimState) -> Result<(), TrimError> {
        let attrs = LeafTrimAttrs {
            last_offset: leaf.last_offset.load(Ordering::SeqCst),
            rate: leaf.rate.load(Ordering::SeqCst),
            partial: leaf.partial.load(Ordering::SeqCst),
            secure: leaf.secure.load(Ordering::SeqCst),
            state,
            action_time: self.clock.now_ms() as i64,
        };
        self.attrs.store(leaf.id, &attrs)?;
        Ok(())
    }

    /// `vdev_trim`: begin (or resume) a manual trim on one leaf.
    pub fn start(&self, leaf_id: u64, activation: TrimActivation) -> Result<(), TrimError> {
        let leaf = self.get_leaf(leaf_id)?;
        let top = self.get_top_group(leaf.top_group)?;

        let mut state = leaf.trim_lock.lock().unwrap();
        if *state == TrimState::Active {
            return Err(TrimError::AlreadyActive(leaf_id));
        }
        let fresh_run = matches!(*state, TrimState::None | TrimState::Complete | TrimState::Canceled);

        if fresh_run {
            leaf.last_offset.store(0, Ordering::SeqCst);
            leaf.rate.store(activation.rate.unwrap_or(0), Ordering::SeqCst);
            leaf.partial.store(activation.partial.unwrap_or(false), Ordering::SeqCst);
            leaf.secure.store(activation.secure.unwrap_or(false), Ordering::SeqCst);
        } else {
            if let Some(rate) = activation.rate {
                leaf.rate.store(rate, Ordering::SeqCst);
            }
            if let Some(partial) = activation.partial {
                leaf.partial.store(partial, Ordering::SeqCst);
            }
            if let Some(secure) = activation.secure {
                leaf.secure.store(secure, Ordering::SeqCst);
            }
        }

        leaf.exit_wanted.store(false, Ordering::SeqCst);
        *state = TrimState::Active;
        drop(state);
        self.persist(&leaf, TrimState::Active)?;
        self.emit(leaf_id, "manual trim started");

        self.spawn_manual_worker(leaf, top);
        Ok(())
    }

    fn spawn_manual_worker(&self, leaf: Arc<LeafRuntime>, top: Arc<TopGroupRuntime>) {
        let cfg = self.config.lock().unwrap().clone();
        let attrs_store = Arc::clone(&self.attrs);
        let port = Arc::clone(&self.port);
        let stats = Arc::clone(&self.stats);
        let clock = Arc::clone(&self.clock);

        let handle = std::thread::spawn(move || {
            let params = ManualWorkerParams {
                extent_bytes_max: cfg.extent_bytes_max,
                extent_bytes_min: cfg.extent_bytes_min,
                queue_limit: cfg.queue_limit,
            };
            let result = run_manual_pass(&leaf, &top, &params, &attrs_store, port.as_ref(), &stats, clock.as_ref());

            let mut state_guard = leaf.trim_lock.lock().unwrap();
            if result.is_ok() && !leaf.should_stop() {
                *state_guard = TrimState::Complete;
            }
            let final_state = *state_guard;
            drop(state_guard);

            let attrs = LeafTrimAttrs {
                last_offset: leaf.last_offset.load(Ordering::SeqCst),
                rate: leaf.rate.load(Ordering::SeqCst),
                partial: leaf.partial.load(Ordering::SeqCst),
                secure: leaf.secure.load(Ordering::SeqCst),
                state: final_state,
                action_time: clock.now_ms() as i64,
            };
            let _ = attrs_store.store(leaf.id, &attrs);

            *leaf.worker.lock().unwrap() = None;
            leaf.trim_cv.notify_all();
        });

        *leaf.worker.lock().unwrap() = Some(handle);
    }

    /// `vdev_trim_stop`: request a transition to `Suspended` or `Canceled`.
    /// Cancel is meaningful to persist even with no worker attached (a leaf
    /// that never started, or already finished, must still be cancelable),
    /// so only a non-cancel target requires an active or suspended worker.
    pub fn stop(&self, leaf_id: u64, target: TrimState) -> Result<(), TrimError> {
        let leaf = self.get_leaf(leaf_id)?;
        let mut state = leaf.trim_lock.lock().unwrap();
        if target != TrimState::Canceled && !matches!(*state, TrimState::Active | TrimState::Suspended) {
            return Err(TrimError::NotActive(leaf_id));
        }
        *state = target;
        drop(state);

        leaf.exit_wanted.store(true, Ordering::SeqCst);
        leaf.trim_cv.notify_all();
        leaf.io_cv.notify_all();
        self.persist(&leaf, target)?;
        self.emit(leaf_id, format!("manual trim transitioned to {:?}", target));
        Ok(())
    }

    /// `vdev_trim_stop_wait`: request the transition and block until the
    /// worker thread has actually exited.
    pub fn stop_wait(&self, leaf_id: u64, target: TrimState) -> Result<(), TrimError> {
        self.stop(leaf_id, target)?;
        let leaf = self.get_leaf(leaf_id)?;
        let handle = leaf.worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        leaf.exit_wanted.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// `vdev_trim_stop_all`: stop every leaf currently running or suspended.
    pub fn stop_all(&self, target: TrimState) {
        let ids: Vec<u64> = self.leaves.lock().unwrap().keys().copied().collect();
        for id in ids {
            let _ = self.stop_wait(id, target);
        }
    }

    /// `vdev_trim_restart`: after a pool import, relaunch any leaf whose
    /// persisted state was `Active` when the pool went away. Unlike `start`,
    /// this never resets settings — it resumes exactly where the last run
    /// left off.
    pub fn restart(&self, leaf_id: u64) -> Result<(), TrimError> {
        let leaf = self.get_leaf(leaf_id)?;
        let top = self.get_top_group(leaf.top_group)?;
        let attrs = self.attrs.load(leaf.id)?;

        if attrs.state != TrimState::Active {
            return Ok(());
        }
        if leaf.has_worker() {
            return Ok(());
        }

        leaf.last_offset.store(attrs.last_offset, Ordering::SeqCst);
        leaf.rate.store(attrs.rate, Ordering::SeqCst);
        leaf.partial.store(attrs.partial, Ordering::SeqCst);
        leaf.secure.store(attrs.secure, Ordering::SeqCst);
        *leaf.trim_lock.lock().unwrap() = TrimState::Active;
        leaf.exit_wanted.store(false, Ordering::SeqCst);

        self.emit(leaf_id, "manual trim resumed after restart");
        self.spawn_manual_worker(leaf, top);
        Ok(())
    }

    /// `vdev_autotrim`: start (or leave running) the sweep thread for a
    /// top-level group.
    pub fn autotrim_start(&self, top_id: u64) -> Result<(), TrimError> {
        let top = self.get_top_group(top_id)?;
        if top.has_autotrim_worker() {
            return Ok(());
        }
        top.autotrim_exit_wanted.store(false, Ordering::SeqCst);

        let children = self.children_of(&top);
        let cfg = self.config.lock().unwrap().clone();
        let port = Arc::clone(&self.port);
        let stats = Arc::clone(&self.stats);
        let clock = Arc::clone(&self.clock);
        let top_clone = Arc::clone(&top);

        let handle = std::thread::spawn(move || {
            let txgs_per_trim = cfg.txg_batch.max(1);
            let params = AutoWorkerParams {
                extent_bytes_max: cfg.extent_bytes_max,
                extent_bytes_min: cfg.extent_bytes_min,
                queue_limit: cfg.queue_limit,
                txgs_per_trim,
            };
            let mut txg = 0u64;
            loop {
                if top_clone.autotrim_exit_wanted.load(Ordering::SeqCst)
                    || !top_clone.writeable.load(Ordering::SeqCst)
                    || top_clone.removing.load(Ordering::SeqCst)
                {
                    break;
                }
                let phase = txg % txgs_per_trim;
                run_auto_phase(&top_clone, &children, &params, port.as_ref(), &stats, clock.as_ref(), phase, txg);
                txg += 1;

                let guard = top_clone.autotrim_lock.lock().unwrap();
                let _ = top_clone.autotrim_cv.wait_timeout(guard, Duration::from_millis(50)).unwrap();
            }
            *top_clone.autotrim_worker.lock().unwrap() = None;
        });

        *top.autotrim_worker.lock().unwrap() = Some(handle);
        self.emit(0, format!("autotrim started on top group {}", top_id));
        Ok(())
    }

    pub fn autotrim_stop_wait(&self, top_id: u64) -> Result<(), TrimError> {
        let top = self.get_top_group(top_id)?;
        top.autotrim_exit_wanted.store(true, Ordering::SeqCst);
        top.autotrim_cv.notify_all();
        let handle = top.autotrim_worker.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        if !self.config.lock().unwrap().autotrim_enabled {
            vacate_residual_trim(&top);
        }
        Ok(())
    }

    pub fn autotrim_stop_all(&self) {
        let ids: Vec<u64> = self.top_groups.lock().unwrap().keys().copied().collect();
        for id in ids {
            let _ = self.autotrim_stop_wait(id);
        }
    }

    /// `vdev_autotrim_restart`: after import, relaunch autotrim on every
    /// top-level group if the module parameter is still enabled.
    pub fn autotrim_restart(&self) {
        if !self.config.lock().unwrap().autotrim_enabled {
            return;
        }
        let ids: Vec<u64> = self.top_groups.lock().unwrap().keys().copied().collect();
        for id in ids {
            let _ = self.autotrim_start(id);
        }
    }

    pub fn status(&self, leaf_id: u64) -> Result<TrimStatus, TrimError> {
        let leaf = self.get_leaf(leaf_id)?;
        let top = self.get_top_group(leaf.top_group)?;
        let last_offset = leaf.last_offset.load(Ordering::SeqCst);
        let progress = calculate_progress(&top.metaslabs.lock().unwrap(), last_offset);
        Ok(TrimStatus {
            state: leaf.state(),
            last_offset,
            rate: leaf.rate.load(Ordering::SeqCst),
            partial: leaf.partial.load(Ordering::SeqCst),
            secure: leaf.secure.load(Ordering::SeqCst),
            bytes_done: progress.bytes_done,
            bytes_est: progress.bytes_est,
            action_time: leaf.action_time.load(Ordering::SeqCst),
        })
    }

    /// Every leaf id currently attached to the pool, for callers that need
    /// to sweep all of them (e.g. the reclamation policy engine).
    pub fn leaf_ids(&self) -> Vec<u64> {
        self.leaves.lock().unwrap().keys().copied().collect()
    }

    pub fn config(&self) -> TrimConfig {
        self.config.lock().unwrap().clone()
    }

    pub fn set_config(&self, config: TrimConfig) {
        *self.config.lock().unwrap() = config;
    }
}
