//! API Routes
//!
//! Configures the Axum router with the admin endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_handler, get_handler, health_handler, set_handler, stats_handler, warm_handler,
    AppState,
};
use super::response_cache::{with_response_cache, ResponseCacheState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check endpoint
/// - `GET /stats` - Per-store statistics
/// - `POST /caches/:store` - Warm a store with a batch of items
/// - `GET /caches/:store/:key` - Retrieve a value
/// - `PUT /caches/:store/:key` - Store a value
/// - `DELETE /caches/:store/:key` - Delete a key
pub fn create_router(state: AppState) -> Router {
    build_router(state, None)
}

/// Like [`create_router`], but `GET /stats` is served through the response
/// cache. Key reads stay uncached so a PUT is visible immediately.
pub fn create_router_with_response_cache(state: AppState, cache: ResponseCacheState) -> Router {
    build_router(state, Some(cache))
}

fn build_router(state: AppState, cache: Option<ResponseCacheState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut stats = Router::new()
        .route("/stats", get(stats_handler))
        .with_state(state.clone());
    if let Some(cache) = cache {
        stats = with_response_cache(stats, cache);
    }

    Router::new()
        .route("/health", get(health_handler))
        .route("/caches/:store", post(warm_handler))
        .route(
            "/caches/:store/:key",
            get(get_handler).put(set_handler).delete(delete_handler),
        )
        .with_state(state)
        .merge(stats)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
