//! Clock Module
//!
//! Seconds-resolution time source used to stamp and age entries.

use std::fmt::Debug;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> i64;
}

// == System Clock ==
/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

// == Manual Clock ==
/// A clock that only moves when told to. Used to drive age-based behaviour
/// deterministically.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
