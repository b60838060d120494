//! Cache Store Module
//!
//! The expiring key cache: entries stamped on save, invisible once older
//! than the configured maximum age, and physically removed by pruning.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{
    expiry_cutoff, CacheEntry, CacheStats, Clock, SystemClock, MAX_KEY_LENGTH, MAX_VALUE_SIZE,
};
use crate::error::{CacheError, Result};
use crate::storage::{Statement, StorageBackend};

// == Duplicate Policy ==
/// What a second save of an existing key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Discard the old entry and store the new one with a fresh timestamp
    #[default]
    Replace,
    /// Fail the save and keep the old entry (replay detection)
    Reject,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "replace" => Ok(DuplicatePolicy::Replace),
            "reject" => Ok(DuplicatePolicy::Reject),
            other => Err(format!("unknown duplicate policy '{}'", other)),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicatePolicy::Replace => f.write_str("replace"),
            DuplicatePolicy::Reject => f.write_str("reject"),
        }
    }
}

// == Cache Settings ==
/// Construction-time behaviour of an [`ExpiringKeyCache`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheSettings {
    /// Maximum entry age in seconds; 0 disables age-based expiry
    pub max_age: u64,
    /// Behaviour on saving an existing key
    pub on_duplicate: DuplicatePolicy,
}

impl CacheSettings {
    pub fn with_max_age(max_age: u64) -> Self {
        Self {
            max_age,
            ..Self::default()
        }
    }
}

// == Expiring Key Cache ==
/// Key cache whose entries expire by age.
///
/// The `save`/`load`/`delete`/`prune` methods report failure as `false` or
/// `None` and log the cause; the `try_*` variants return the typed error.
#[derive(Debug)]
pub struct ExpiringKeyCache {
    backend: Arc<dyn StorageBackend>,
    clock: Arc<dyn Clock>,
    settings: CacheSettings,
    stats: Mutex<CacheStats>,
}

impl ExpiringKeyCache {
    // == Constructor ==
    /// Creates a cache over `backend` using wall-clock time.
    pub fn new(backend: Arc<dyn StorageBackend>, settings: CacheSettings) -> Self {
        Self::with_clock(backend, settings, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit time source.
    pub fn with_clock(
        backend: Arc<dyn StorageBackend>,
        settings: CacheSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            backend,
            clock,
            settings,
            stats: Mutex::new(CacheStats::new()),
        }
    }

    pub fn max_age(&self) -> u64 {
        self.settings.max_age
    }

    // == Save ==
    /// Stores `value` under `key`, stamped with the current time.
    ///
    /// `expire_after` is accepted but has no effect: the cache-wide
    /// `max_age` alone decides when entries expire.
    pub fn try_save(&self, key: &str, value: &str, expire_after: Option<u64>) -> Result<()> {
        validate_key(key)?;
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidRequest(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }

        if let Some(secs) = expire_after {
            debug!(
                "Ignoring per-call expiry of {}s for key '{}' (max_age={}s applies)",
                secs, key, self.settings.max_age
            );
        }

        let entry = CacheEntry::new(key, value, self.clock.now());
        let statement = match self.settings.on_duplicate {
            DuplicatePolicy::Replace => Statement::Upsert(entry),
            DuplicatePolicy::Reject => Statement::Insert(entry),
        };

        match self.backend.execute_write(&statement) {
            Ok(_) => {
                self.stats_mut().record_save();
                Ok(())
            }
            Err(e) => {
                self.stats_mut().record_failed_save();
                Err(CacheError::from_write(e))
            }
        }
    }

    /// Boolean form of [`try_save`](Self::try_save).
    pub fn save(&self, key: &str, value: &str, expire_after: Option<u64>) -> bool {
        self.try_save(key, value, expire_after)
            .map_err(|e| log_failure("save", key, &e))
            .is_ok()
    }

    // == Load ==
    /// Returns the value stored under `key`.
    ///
    /// Missing and expired entries both yield `CacheError::NotFound`.
    /// `offset` and `limit` are accepted for interface compatibility and
    /// ignored: a key matches at most one entry.
    pub fn try_load(&self, key: &str, _offset: Option<u64>, _limit: Option<u64>) -> Result<String> {
        let row = self
            .backend
            .execute_read_row(&Statement::SelectByKey {
                key: key.to_string(),
            })
            .map_err(CacheError::from_read)?;

        match row {
            Some(entry) if !entry.is_expired(self.settings.max_age, self.clock.now()) => {
                self.stats_mut().record_hit();
                Ok(entry.value)
            }
            _ => {
                self.stats_mut().record_miss();
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    /// Option form of [`try_load`](Self::try_load); storage errors are
    /// logged and reported as `None`.
    pub fn load(&self, key: &str, offset: Option<u64>, limit: Option<u64>) -> Option<String> {
        match self.try_load(key, offset, limit) {
            Ok(value) => Some(value),
            Err(CacheError::NotFound(_)) => None,
            Err(e) => {
                log_failure("load", key, &e);
                None
            }
        }
    }

    // == Delete ==
    /// Removes the entry for `key`. Succeeds whether or not it existed.
    pub fn try_delete(&self, key: &str) -> Result<()> {
        let removed = self
            .backend
            .execute_delete(&Statement::DeleteByKey {
                key: key.to_string(),
            })
            .map_err(CacheError::from_write)?;

        if removed == 0 {
            debug!("Delete of absent key '{}'", key);
        }
        self.stats_mut().record_delete();
        Ok(())
    }

    pub fn delete(&self, key: &str) -> bool {
        self.try_delete(key)
            .map_err(|e| log_failure("delete", key, &e))
            .is_ok()
    }

    // == Clear ==
    /// Always returns `true` and leaves every entry in place.
    ///
    /// Entries only leave the cache through `delete` or pruning.
    pub fn clear(&self) -> bool {
        debug!("Clear requested; entries are left for pruning");
        true
    }

    // == Prune ==
    /// Deletes every entry older than `max_age`, returning how many went.
    ///
    /// With `max_age == 0` nothing is ever removed.
    pub fn try_prune(&self) -> Result<usize> {
        let Some(cutoff) = expiry_cutoff(self.settings.max_age, self.clock.now()) else {
            return Ok(0);
        };

        let removed = self
            .backend
            .execute_delete(&Statement::DeleteOlderThan { cutoff })
            .map_err(CacheError::from_write)?;

        self.stats_mut().record_pruned(removed);
        Ok(removed as usize)
    }

    pub fn prune(&self) -> bool {
        match self.try_prune() {
            Ok(removed) => {
                if removed > 0 {
                    debug!("Pruned {} expired entries", removed);
                }
                true
            }
            Err(e) => {
                warn!("Prune failed: {}", e);
                false
            }
        }
    }

    // == Release ==
    /// Consumes the cache, pruning synchronously.
    pub fn close(self) -> bool {
        let pruned = self.prune();
        info!("Cache closed (prune {})", if pruned { "ok" } else { "failed" });
        pruned
    }

    /// Releases this handle and prunes on a blocking worker without waiting.
    ///
    /// Failures are logged, not returned. Must be called from within a Tokio
    /// runtime.
    pub fn release(self: Arc<Self>) -> JoinHandle<()> {
        tokio::task::spawn_blocking(move || match self.try_prune() {
            Ok(removed) => debug!("Release prune removed {} entries", removed),
            Err(e) => warn!("Release prune failed: {}", e),
        })
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats_mut().clone();
        stats.set_total_entries(self.len());
        stats
    }

    // == Length ==
    /// Returns the number of stored entries, expired-but-unpruned included.
    pub fn len(&self) -> usize {
        self.backend.count().unwrap_or_else(|e| {
            warn!("Could not count entries: {}", e);
            0
        })
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn stats_mut(&self) -> MutexGuard<'_, CacheStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidRequest(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn log_failure(op: &str, key: &str, err: &CacheError) {
    match err {
        CacheError::Conflict(_) => debug!("{} of key '{}' rejected: {}", op, key, err),
        _ => warn!("{} of key '{}' failed: {}", op, key, err),
    }
}
