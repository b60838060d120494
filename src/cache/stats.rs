//! Cache Statistics Module
//!
//! Tracks cache activity: lookups, writes, deletions and pruning.

use serde::Serialize;

// == Cache Stats ==
/// Counters describing cache activity since start-up.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Loads that returned a value
    pub hits: u64,
    /// Loads that found nothing (absent or expired)
    pub misses: u64,
    /// Successful saves
    pub saves: u64,
    /// Saves rejected by the backend (duplicate key or write failure)
    pub failed_saves: u64,
    /// Successful delete calls, whether or not a row existed
    pub deletes: u64,
    /// Entries removed by pruning
    pub pruned: u64,
    /// Current number of stored entries
    pub total_entries: usize,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the load hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no loads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Save ==
    /// Increments the successful save counter.
    pub fn record_save(&mut self) {
        self.saves += 1;
    }

    // == Record Failed Save ==
    /// Increments the failed save counter.
    pub fn record_failed_save(&mut self) {
        self.failed_saves += 1;
    }

    // == Record Delete ==
    /// Increments the delete counter.
    pub fn record_delete(&mut self) {
        self.deletes += 1;
    }

    // == Record Pruned ==
    /// Adds `count` to the pruned total.
    pub fn record_pruned(&mut self, count: u64) {
        self.pruned += count;
    }

    // == Update Entry Count ==
    /// Updates the total entries count.
    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
