//! Time sources
//!
//! The gate reads the clock once per operation; every check inside that
//! operation sees the same instant.

use crate::types::Timestamp;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of logical time in whole seconds
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current time
    fn now(&self) -> Timestamp;
}

/// Wall clock (UTC seconds)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        // Pre-epoch wall time clamps to zero
        Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Settable clock for tests and scenario replays
///
/// Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create clock at `start`
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Jump to `at`. Moving backwards is ignored.
    pub fn set(&self, at: Timestamp) {
        self.now.fetch_max(at, Ordering::SeqCst);
    }

    /// Move forward by `seconds`
    pub fn advance(&self, seconds: u64) {
        // The closure always returns Some, so the update cannot fail
        let _ = self
            .now
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(seconds))
            });
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
