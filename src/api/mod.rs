//! API Module
//!
//! HTTP handlers and routing for the cache REST API.
//!
//! # Endpoints
//! - `GET /health` - Health check with the active backend
//! - `GET /stats` - Cache and rate limit statistics
//! - `GET|PUT|DELETE /cache/:key` - Read, write or drop one entry
//! - `GET /cache/:key/exists` - Presence check
//! - `GET|PATCH /cache/:key/ttl` - Read or replace the remaining lifetime
//! - `DELETE /cache?pattern=...` - Glob invalidation
//! - `DELETE /namespaces/:namespace` - Namespace invalidation

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
