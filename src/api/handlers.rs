//! API Handlers
//!
//! HTTP request handlers for the admin endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{CacheError, Result};
use crate::manager::CacheManager;
use crate::models::{
    DeleteResponse, GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse,
    WarmRequest, WarmResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<CacheManager>,
}

impl AppState {
    pub fn new(manager: Arc<CacheManager>) -> Self {
        Self { manager }
    }
}

/// Handler for GET /caches/:store/:key
///
/// Unknown store names read from the default store.
pub async fn get_handler(
    State(state): State<AppState>,
    Path((store, key)): Path<(String, String)>,
) -> Result<Json<GetResponse>> {
    let handle = state.manager.get_cache(&store);
    let value = handle
        .get(key.as_str(), None)
        .await
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(handle.name(), key, value)))
}

/// Handler for PUT /caches/:store/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path((store, key)): Path<(String, String)>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    let handle = state.manager.get_cache(&store);
    let ttl = req.ttl();
    let outcome = handle.set(key.as_str(), req.value, ttl, None).await;

    Ok(Json(SetResponse::new(
        handle.name(),
        key,
        outcome.evicted.map(|k| k.to_string()),
    )))
}

/// Handler for DELETE /caches/:store/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path((store, key)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    if state.manager.invalidate(&store, key.as_str(), None).await {
        Ok(Json(DeleteResponse::new(key)))
    } else {
        Err(CacheError::NotFound(key))
    }
}

/// Handler for POST /caches/:store
///
/// Bulk-loads items into the store.
pub async fn warm_handler(
    State(state): State<AppState>,
    Path(store): Path<String>,
    Json(req): Json<WarmRequest>,
) -> Result<Json<WarmResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let name = state.manager.get_cache(&store).name().to_string();
    let warmed = state.manager.warm_cache(&store, req.into_items()).await;

    Ok(Json(WarmResponse { store: name, warmed }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        stores: state.manager.get_all_stats().await,
        write_behind_pending: state.manager.write_behind_queue().len(),
    })
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
