//! Cache Module
//!
//! Provides the age-expiring key cache and its supporting types.

mod clock;
mod entry;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::{expiry_cutoff, CacheEntry};
pub use stats::CacheStats;
pub use store::{CacheSettings, DuplicatePolicy, ExpiringKeyCache};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
