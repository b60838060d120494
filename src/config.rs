//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use crate::cache::{CacheSettings, DuplicatePolicy};
use crate::error::StorageError;
use crate::storage::TableSchema;

/// Which storage backend holds the cache entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Memory => f.write_str("memory"),
            BackendKind::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum entry age in seconds, 0 for no limit
    pub max_age: u64,
    /// Behaviour when a key is saved twice
    pub on_duplicate: DuplicatePolicy,
    /// Storage backend
    pub backend: BackendKind,
    /// SQLite database file (sqlite backend only)
    pub database_path: String,
    /// Prefix prepended to the table name
    pub db_prefix: String,
    /// Table holding the entries
    pub table: String,
    /// Column holding the key
    pub key_column: String,
    /// Column holding the value
    pub value_column: String,
    /// Column holding the insertion timestamp
    pub ts_column: String,
    /// HTTP server port
    pub server_port: u16,
    /// Background prune task interval in seconds
    pub prune_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_AGE` - Maximum entry age in seconds (default: 0, no limit)
    /// - `CACHE_ON_DUPLICATE` - `replace` or `reject` (default: replace)
    /// - `CACHE_BACKEND` - `memory` or `sqlite` (default: memory)
    /// - `CACHE_DATABASE_PATH` - SQLite file (default: hmac_cache.db)
    /// - `CACHE_DB_PREFIX` - Table name prefix (default: empty)
    /// - `CACHE_TABLE` - Table name (default: hmac_cache)
    /// - `CACHE_KEY_COLUMN` / `CACHE_VALUE_COLUMN` / `CACHE_TS_COLUMN` -
    ///   Column names (default: hmac / data / ts)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `PRUNE_INTERVAL` - Prune frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_age: parse_var("CACHE_MAX_AGE").unwrap_or(defaults.max_age),
            on_duplicate: parse_var("CACHE_ON_DUPLICATE").unwrap_or(defaults.on_duplicate),
            backend: parse_var("CACHE_BACKEND").unwrap_or(defaults.backend),
            database_path: env::var("CACHE_DATABASE_PATH").unwrap_or(defaults.database_path),
            db_prefix: env::var("CACHE_DB_PREFIX").unwrap_or(defaults.db_prefix),
            table: env::var("CACHE_TABLE").unwrap_or(defaults.table),
            key_column: env::var("CACHE_KEY_COLUMN").unwrap_or(defaults.key_column),
            value_column: env::var("CACHE_VALUE_COLUMN").unwrap_or(defaults.value_column),
            ts_column: env::var("CACHE_TS_COLUMN").unwrap_or(defaults.ts_column),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            prune_interval: parse_var("PRUNE_INTERVAL").unwrap_or(defaults.prune_interval),
        }
    }

    /// Settings handed to the cache constructor.
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            max_age: self.max_age,
            on_duplicate: self.on_duplicate,
        }
    }

    /// Validated table schema for SQL backends.
    pub fn table_schema(&self) -> Result<TableSchema, StorageError> {
        TableSchema::new(
            self.db_prefix.clone(),
            self.table.clone(),
            self.key_column.clone(),
            self.value_column.clone(),
            self.ts_column.clone(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_age: 0,
            on_duplicate: DuplicatePolicy::Replace,
            backend: BackendKind::Memory,
            database_path: "hmac_cache.db".to_string(),
            db_prefix: String::new(),
            table: "hmac_cache".to_string(),
            key_column: "hmac".to_string(),
            value_column: "data".to_string(),
            ts_column: "ts".to_string(),
            server_port: 3000,
            prune_interval: 60,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
