//! API Routes
//!
//! Configures the Axum router with all cache server endpoints.

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_handler, delete_handler, health_handler, load_handler, prune_handler, save_handler,
    stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /save` - Store a key-value pair
/// - `GET /load/:key` - Retrieve a value by key
/// - `DELETE /delete/:key` - Delete a key
/// - `POST /clear` - Clear request (entries are kept)
/// - `POST /prune` - Remove entries older than the maximum age
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin
/// - Tracing: Logs all requests
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/save", put(save_handler))
        .route("/load/:key", get(load_handler))
        .route("/delete/:key", delete(delete_handler))
        .route("/clear", post(clear_handler))
        .route("/prune", post(prune_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
