//! Range Translator (C2): convert a metaslab-relative logical range into a
//! leaf-physical range, and estimate manual-trim progress across a
//! top-level group's metaslabs.
//!
//! This crate's pool model does not implement raidz column mapping, so
//! `translate` is the identity function here — the hook exists so a
//! redundancy-aware pool layer can later narrow a logical range to the
//! slice of it that actually lands on a given child, exactly as
//! `vdev_xlate` does for raidz children in the source.

use crate::trim_types::{Metaslab, RangeSeg, TrimType};

pub const LABEL_START_SIZE: u64 = 4 << 20; // 4 MiB, mirrors VDEV_LABEL_START_SIZE in spirit.

/// `translate(leaf, logical) -> physical`. Identity for plain/top-level
/// leaves; a redundancy-aware layer would narrow this for raidz children.
pub fn translate(logical: RangeSeg) -> RangeSeg {
    logical
}

/// `add_range(ta, start, size)`: called as the `ms_allocatable`/`ms_trim`
/// walk callback. Returns the physical range to insert into the trim tree,
/// or `None` if it should be discarded (either because Manual has already
/// passed it, or because translation narrowed it to nothing).
pub fn add_range(trim_type: TrimType, last_offset: u64, logical_start: u64, logical_size: u64) -> Option<RangeSeg> {
    let logical = RangeSeg::new(logical_start, logical_start + logical_size);
    let mut physical = translate(logical);

    if trim_type == TrimType::Manual {
        if physical.end <= last_offset {
            return None;
        }
        if last_offset > physical.start {
            physical = RangeSeg::new(last_offset, physical.end);
        }
    }

    if physical.end > physical.start {
        Some(physical)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TrimProgress {
    pub bytes_done: u64,
    pub bytes_est: u64,
}

/// `calculate_progress(leaf)`: walk every metaslab in the owning top group
/// and classify it relative to `last_offset`, per SPEC_FULL.md 4.2.
pub fn calculate_progress(metaslabs: &[Metaslab], last_offset: u64) -> TrimProgress {
    let mut progress = TrimProgress::default();

    for msp in metaslabs {
        let logical = RangeSeg::new(msp.start, msp.start + msp.size);
        let physical = translate(logical);
        let ms_free = msp.free_bytes();

        if last_offset <= physical.start {
            progress.bytes_est += ms_free;
            continue;
        }
        if last_offset > physical.end {
            progress.bytes_done += ms_free;
            progress.bytes_est += ms_free;
            continue;
        }

        // In the middle of this metaslab: walk ms_allocatable precisely.
        for seg in msp.ms_allocatable.ranges() {
            let phys_seg = translate(seg);
            let size = phys_seg.len();
            progress.bytes_est += size;
            if last_offset >= phys_seg.end {
                progress.bytes_done += size;
            } else if last_offset > phys_seg.start && last_offset <= phys_seg.end {
                progress.bytes_done += last_offset - phys_seg.start;
            }
        }
    }

    progress
}
