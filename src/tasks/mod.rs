//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Prune: removes entries older than the cache's maximum age

mod prune;

pub use prune::spawn_prune_task;
