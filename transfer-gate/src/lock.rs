//! Global lock configuration and phase predicates
//!
//! The lock timeline, when `is_locked` is set:
//!
//! ```text
//!   hard lock            quota window                 unrestricted
//! ──────────────┬──────────────────────────────┬──────────────────────▶ t
//!        first_unlock_time              second_unlock_time
//! ```
//!
//! The hard lock ends strictly before `first_unlock_time`; the quota window
//! is half-open `[first_unlock_time, second_unlock_time)`. The two instants
//! are not required to be ordered: if `second < first` the quota window is
//! empty.

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};

/// Global lock flag and the two unlock timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LockConfig {
    /// Global lock switch
    pub is_locked: bool,

    /// End of the hard lock, start of the quota window
    pub first_unlock_time: Timestamp,

    /// End of the quota window
    pub second_unlock_time: Timestamp,
}

impl LockConfig {
    /// Create a lock configuration
    pub fn new(is_locked: bool, first_unlock_time: Timestamp, second_unlock_time: Timestamp) -> Self {
        Self {
            is_locked,
            first_unlock_time,
            second_unlock_time,
        }
    }

    /// Overwrite all three fields at once
    pub fn replace(&mut self, next: LockConfig) -> LockConfig {
        std::mem::replace(self, next)
    }

    /// Hard-lock phase: lock on and `now` strictly before the first unlock.
    ///
    /// Exception membership is applied by the caller.
    pub fn in_hard_lock(&self, now: Timestamp) -> bool {
        self.is_locked && now < self.first_unlock_time
    }

    /// Quota window: lock on and `now` in `[first, second)`
    pub fn in_quota_window(&self, now: Timestamp) -> bool {
        self.is_locked && now >= self.first_unlock_time && now < self.second_unlock_time
    }
}
