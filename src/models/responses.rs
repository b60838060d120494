//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the LOAD operation (GET /load/:key)
#[derive(Debug, Clone, Serialize)]
pub struct LoadResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl LoadResponse {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SAVE operation (PUT /save)
#[derive(Debug, Clone, Serialize)]
pub struct SaveResponse {
    /// Success message
    pub message: String,
    /// The key that was saved
    pub key: String,
}

impl SaveResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' saved successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /delete/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for the CLEAR operation (POST /clear)
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// Response body for the PRUNE operation (POST /prune)
#[derive(Debug, Clone, Serialize)]
pub struct PruneResponse {
    /// Number of entries removed
    pub removed: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Configured maximum age in seconds
    pub max_age: u64,
}

impl StatsResponse {
    pub fn new(stats: CacheStats, max_age: u64) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            max_age,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
