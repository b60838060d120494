//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Request body for the SAVE operation (PUT /save)
///
/// # Fields
/// - `key`: The cache key (e.g. an HMAC signature)
/// - `value`: The value to store
/// - `expire_after`: Optional per-entry expiry in seconds; accepted but the
///   cache-wide maximum age applies
///
/// Key rules are enforced by the cache itself on save.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional expiry in seconds
    #[serde(default)]
    pub expire_after: Option<u64>,
}

/// Query string for the LOAD operation (GET /load/:key)
///
/// Both fields are accepted and ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoadQuery {
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}
