//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with age tracking.

// == Cache Entry ==
/// A single cache entry: key, payload and the second it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// Unique key (e.g. an HMAC signature)
    pub key: String,
    /// The stored value
    pub value: String,
    /// Insertion timestamp (Unix seconds), never updated in place
    pub inserted_at: i64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped with `inserted_at`.
    pub fn new(key: impl Into<String>, value: impl Into<String>, inserted_at: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            inserted_at,
        }
    }

    // == Age ==
    /// Returns the age in seconds at `now`, clamped at zero for clock skew.
    pub fn age(&self, now: i64) -> u64 {
        now.saturating_sub(self.inserted_at).max(0) as u64
    }

    // == Is Expired ==
    /// Checks whether the entry is older than `max_age` at `now`.
    ///
    /// Boundary condition: an entry whose age equals `max_age` is still live;
    /// only strictly older entries are expired. A `max_age` of zero never
    /// expires anything.
    pub fn is_expired(&self, max_age: u64, now: i64) -> bool {
        max_age != 0 && self.age(now) > max_age
    }
}

// == Utility Functions ==
/// Timestamp below which entries are older than `max_age` at `now`.
///
/// Returns `None` when `max_age` is zero (nothing ever expires).
pub fn expiry_cutoff(max_age: u64, now: i64) -> Option<i64> {
    if max_age == 0 {
        return None;
    }
    let max_age = i64::try_from(max_age).unwrap_or(i64::MAX);
    Some(now.saturating_sub(max_age))
}
