//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `PUT /save` - Store a key-value pair
//! - `GET /load/:key` - Retrieve a value by key
//! - `DELETE /delete/:key` - Delete a key
//! - `POST /clear` - Clear request (entries are kept)
//! - `POST /prune` - Remove expired entries now
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
