//! Shared data model for the TRIM subsystem: range segments, the in-memory
//! range tree used for both `ms_allocatable` and `ms_trim`, and the
//! lightweight metaslab/top-group descriptors the trim workers walk.

use std::collections::BTreeMap;

/// Half-open byte interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSeg {
    pub start: u64,
    pub end: u64,
}

impl RangeSeg {
    pub fn new(start: u64, end: u64) -> Self {
        assert!(end >= start, "range end must not precede start");
        RangeSeg { start, end }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// An in-memory set of disjoint byte ranges, kept merged on insert.
///
/// This is the analog of `ms_allocatable`/`ms_trim`: a `start -> end` map
/// with adjacent runs coalesced, supporting the walk/swap/vacate operations
/// the trim workers rely on.
#[derive(Debug, Clone, Default)]
pub struct RangeTree {
    runs: BTreeMap<u64, u64>,
}

impl RangeTree {
    pub fn new() -> Self {
        RangeTree { runs: BTreeMap::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Add a range, merging with any contiguous neighbors.
    pub fn add(&mut self, start: u64, size: u64) {
        if size == 0 {
            return;
        }
        let mut new_start = start;
        let mut new_end = start + size;

        if let Some((&prev_start, &prev_end)) = self.runs.range(..=new_start).next_back() {
            if prev_end >= new_start {
                new_start = new_start.min(prev_start);
                new_end = new_end.max(prev_end);
                self.runs.remove(&prev_start);
            }
        }
        while let Some((&next_start, &next_end)) = self.runs.range(new_start..).next() {
            if next_start <= new_end {
                new_end = new_end.max(next_end);
                self.runs.remove(&next_start);
            } else {
                break;
            }
        }
        self.runs.insert(new_start, new_end);
    }

    /// True iff `[start, start+size)` is fully contained in some run.
    pub fn contains(&self, start: u64, size: u64) -> bool {
        if size == 0 {
            return true;
        }
        match self.runs.range(..=start).next_back() {
            Some((&run_start, &run_end)) => run_start <= start && start + size <= run_end,
            None => false,
        }
    }

    /// Find the run covering `start`, if any, returning its full extent.
    pub fn find_covering(&self, start: u64) -> Option<RangeSeg> {
        self.runs
            .range(..=start)
            .next_back()
            .filter(|(&run_start, &run_end)| run_start <= start && start < run_end)
            .map(|(&s, &e)| RangeSeg::new(s, e))
    }

    /// Visit every run in ascending start order.
    pub fn walk(&self, mut f: impl FnMut(u64, u64)) {
        for (&start, &end) in &self.runs {
            f(start, end - start);
        }
    }

    /// Replace `self` with an empty tree, returning the old contents.
    pub fn swap_out(&mut self) -> RangeTree {
        std::mem::take(self)
    }

    /// Swap the contents of two trees in place (used when the allocator
    /// hands a metaslab's `ms_trim` to the autotrim worker).
    pub fn swap(&mut self, other: &mut RangeTree) {
        std::mem::swap(self, other);
    }

    /// Drop all contents.
    pub fn vacate(&mut self) {
        self.runs.clear();
    }

    pub fn ranges(&self) -> Vec<RangeSeg> {
        self.runs.iter().map(|(&s, &e)| RangeSeg::new(s, e)).collect()
    }
}

/// Trim flavor: manual (user/administrator initiated, one worker per leaf,
/// durable progress) or auto (one worker per top-level group, best-effort,
/// no durable progress).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrimType {
    Manual,
    Auto,
}

impl TrimType {
    pub fn index(self) -> usize {
        match self {
            TrimType::Manual => 0,
            TrimType::Auto => 1,
        }
    }
}

/// Per-job trim flags. Only `secure` is defined, matching the source's
/// single-bit `trim_flags` field; modeled as a bool rather than a bitfield
/// since no second flag has ever been added upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrimFlags {
    pub secure: bool,
}

/// A fixed-size allocator region within a top-level group.
pub struct Metaslab {
    pub index: usize,
    pub start: u64,
    pub size: u64,
    pub loaded: bool,
    /// Number of concurrent disablers (manual trim, autotrim, initialize, ...).
    pub disabled: u32,
    /// Whether a space map has ever been allocated for this metaslab; used
    /// to distinguish "never written" metaslabs for the `Partial` skip rule.
    pub has_space_map: bool,
    pub ms_allocatable: RangeTree,
    pub ms_trim: RangeTree,
}

impl Metaslab {
    pub fn new(index: usize, start: u64, size: u64) -> Self {
        Metaslab {
            index,
            start,
            size,
            loaded: false,
            disabled: 0,
            has_space_map: false,
            ms_allocatable: RangeTree::new(),
            ms_trim: RangeTree::new(),
        }
    }

    /// Free bytes per the allocatable tree (stand-in for
    /// `ms_size - metaslab_allocated_space(msp)`).
    pub fn free_bytes(&self) -> u64 {
        self.ms_allocatable.ranges().iter().map(|r| r.len()).sum()
    }

    pub fn disable(&mut self) {
        self.disabled += 1;
    }

    pub fn enable(&mut self, _issued: bool) {
        self.disabled = self.disabled.saturating_sub(1);
    }
}

/// Per-walk trim job state, built fresh for each metaslab pass.
pub struct TrimArgs {
    pub trim_type: TrimType,
    pub msp_index: usize,
    pub trim_tree: RangeTree,
    pub start_time_ms: u64,
    pub bytes_done: u64,
    pub extent_bytes_max: u64,
    pub extent_bytes_min: u64,
    pub flags: TrimFlags,
}

impl TrimArgs {
    pub fn new(trim_type: TrimType, msp_index: usize, extent_bytes_max: u64, extent_bytes_min: u64) -> Self {
        TrimArgs {
            trim_type,
            msp_index,
            trim_tree: RangeTree::new(),
            start_time_ms: 0,
            bytes_done: 0,
            extent_bytes_max,
            extent_bytes_min,
            flags: TrimFlags::default(),
        }
    }

    /// bytes/sec observed so far, per the governor's rate-gate formula.
    pub fn measured_rate(&self, now_ms: u64) -> u64 {
        let elapsed = now_ms.saturating_sub(self.start_time_ms);
        self.bytes_done * 1000 / (elapsed + 1)
    }
}
