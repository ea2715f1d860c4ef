use std::sync::atomic::{AtomicU64, Ordering};

use mintcap_core::types::Timestamp;

/// Source of the timestamps that pick a mint's year bucket.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall clock (UTC seconds). Pre-epoch readings clamp to zero.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        chrono::Utc::now().timestamp().max(0) as Timestamp
    }
}

/// Clock that only moves when told to. Used by tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: Timestamp) -> Self {
        Self { now: AtomicU64::new(now) }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}
