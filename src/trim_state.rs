//! The lifecycle state machine shared by every leaf's manual TRIM runtime.

use serde::{Deserialize, Serialize};

/// A leaf's manual TRIM state, persisted as one of five small integers.
///
/// ```text
/// None ──start──▶ Active ──worker done──▶ Complete
/// Active ──stop(Suspended)──▶ Suspended ──start──▶ Active
/// Active ──stop(Canceled)──▶ Canceled
/// Suspended ──stop(Canceled)──▶ Canceled
/// Complete ──start──▶ Active (settings reset via TrimActivation sentinels)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u64)]
pub enum TrimState {
    None = 0,
    Active = 1,
    Canceled = 2,
    Suspended = 3,
    Complete = 4,
}

impl TrimState {
    pub fn is_running(self) -> bool {
        matches!(self, TrimState::Active)
    }
}

impl Default for TrimState {
    fn default() -> Self {
        TrimState::None
    }
}
