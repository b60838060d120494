//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Json,
};

use crate::cache::ExpiringKeyCache;
use crate::config::{BackendKind, Config};
use crate::error::{CacheError, Result, StorageError};
use crate::models::{
    ClearResponse, DeleteResponse, HealthResponse, LoadQuery, LoadResponse, PruneResponse,
    SaveRequest, SaveResponse, StatsResponse,
};
use crate::storage::{MemoryBackend, SqliteBackend, StorageBackend};

/// Application state shared across all handlers.
///
/// The cache synchronises internally, so handlers share it through a plain `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<ExpiringKeyCache>,
}

impl AppState {
    pub fn new(cache: ExpiringKeyCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Opens the configured backend and builds the cache over it.
    pub fn from_config(config: &Config) -> std::result::Result<Self, StorageError> {
        let backend: Arc<dyn StorageBackend> = match config.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::Sqlite => Arc::new(SqliteBackend::open(
                &config.database_path,
                config.table_schema()?,
            )?),
        };
        Ok(Self::new(ExpiringKeyCache::new(
            backend,
            config.cache_settings(),
        )))
    }
}

/// Runs a cache operation on the blocking pool.
///
/// Backends may hold a connection lock and do file I/O, which must stay off
/// the async worker threads.
async fn run_blocking<T, F>(cache: &Arc<ExpiringKeyCache>, op: F) -> Result<T>
where
    F: FnOnce(&ExpiringKeyCache) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let cache = Arc::clone(cache);
    tokio::task::spawn_blocking(move || op(&cache))
        .await
        .map_err(|e| CacheError::Internal(format!("cache worker did not complete: {}", e)))?
}

/// Handler for PUT /save
///
/// Stores a key-value pair. Responds 400 for malformed bodies and invalid
/// keys, and 409 when the key exists and the cache rejects duplicates.
pub async fn save_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SaveRequest>, JsonRejection>,
) -> Result<Json<SaveResponse>> {
    let Json(req) = payload?;

    let key = req.key.clone();
    run_blocking(&state.cache, move |cache| {
        cache.try_save(&req.key, &req.value, req.expire_after)
    })
    .await?;

    Ok(Json(SaveResponse::new(key)))
}

/// Handler for GET /load/:key
///
/// Responds 404 for both absent and expired keys.
pub async fn load_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<LoadQuery>,
) -> Result<Json<LoadResponse>> {
    let lookup = key.clone();
    let value = run_blocking(&state.cache, move |cache| {
        cache.try_load(&lookup, query.offset, query.limit)
    })
    .await?;

    Ok(Json(LoadResponse::new(key, value)))
}

/// Handler for DELETE /delete/:key
///
/// Succeeds whether or not the key existed.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let target = key.clone();
    run_blocking(&state.cache, move |cache| cache.try_delete(&target)).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    Json(ClearResponse {
        cleared: state.cache.clear(),
    })
}

/// Handler for POST /prune
///
/// Runs a prune immediately instead of waiting for the background task.
pub async fn prune_handler(State(state): State<AppState>) -> Result<Json<PruneResponse>> {
    let removed = run_blocking(&state.cache, |cache| cache.try_prune()).await?;

    Ok(Json(PruneResponse { removed }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = run_blocking(&state.cache, |cache| Ok(cache.stats())).await?;

    Ok(Json(StatsResponse::new(stats, state.cache.max_age())))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
