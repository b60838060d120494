//! HMAC Cache - an age-expiring key cache
//!
//! Remembers keys (typically HMAC signatures of signed requests) for a
//! bounded time so replays can be detected, over in-memory or SQLite storage.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod storage;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheSettings, DuplicatePolicy, ExpiringKeyCache};
pub use config::Config;
pub use tasks::spawn_prune_task;
