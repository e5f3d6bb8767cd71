//! API Module
//!
//! Admin REST API and the response-cache middleware.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Per-store statistics
//! - `POST /caches/:store` - Warm a store
//! - `GET|PUT|DELETE /caches/:store/:key` - Read, write or delete a key

pub mod handlers;
pub mod response_cache;
pub mod routes;

pub use handlers::*;
pub use response_cache::{
    response_cache_middleware, with_response_cache, CachedResponse, ResponseCacheState,
    RESPONSE_STORE, X_CACHE,
};
pub use routes::{create_router, create_router_with_response_cache};
