//! Response Cache Middleware
//!
//! Serves repeated idempotent reads from a cache store. Keys are derived from
//! the method, path (with query) and `Accept` header.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::cache::{CacheKey, StoreHandle};
use crate::error::CacheError;
use crate::manager::CacheManager;

/// Response header reporting whether the cache answered.
pub const X_CACHE: &str = "x-cache";

/// Store the server binary caches responses in.
pub const RESPONSE_STORE: &str = "http-responses";

const KEY_NAMESPACE: &str = "http";

/// Largest body that will be buffered and cached.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

// == Cached Response ==
/// What gets stored for a cached response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub body: String,
    pub content_type: Option<String>,
    /// Unix milliseconds when the response was cached
    pub timestamp: i64,
}

impl CachedResponse {
    fn into_hit_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        let mut response = (status, self.body).into_response();

        if let Some(content_type) = self
            .content_type
            .as_deref()
            .and_then(|ct| HeaderValue::from_str(ct).ok())
        {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        response
            .headers_mut()
            .insert(X_CACHE, HeaderValue::from_static("HIT"));
        response
    }
}

// == Middleware State ==
#[derive(Clone)]
pub struct ResponseCacheState {
    manager: Arc<CacheManager>,
    store: String,
    ttl: Duration,
    max_body_bytes: usize,
}

impl ResponseCacheState {
    pub fn new(manager: Arc<CacheManager>, store: impl Into<String>, ttl: Duration) -> Self {
        Self {
            manager,
            store: store.into(),
            ttl,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    fn store(&self) -> StoreHandle {
        self.manager.get_cache(&self.store)
    }
}

/// Wraps `router` so its idempotent reads go through the response cache.
pub fn with_response_cache(router: Router, state: ResponseCacheState) -> Router {
    router.layer(middleware::from_fn_with_state(state, response_cache_middleware))
}

pub fn is_idempotent_read(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

/// Derives the cache key for a request.
pub fn response_key(request: &Request) -> CacheKey {
    let path = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let accept = request
        .headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    CacheKey::new(
        Some(KEY_NAMESPACE),
        json!({
            "method": request.method().as_str(),
            "path": path,
            "accept": accept,
        }),
    )
}

// == Middleware ==
/// Cache-aside lookup around the inner handler.
///
/// Hits short-circuit with `X-Cache: HIT`. Misses run the handler, mark the
/// response `X-Cache: MISS`, and store 2xx responses in the background.
pub async fn response_cache_middleware(
    State(state): State<ResponseCacheState>,
    request: Request,
    next: Next,
) -> Response {
    if !is_idempotent_read(request.method()) {
        return next.run(request).await;
    }

    let key = response_key(&request);
    let store = state.store();

    if let Some(cached) = store.get_key(&key).await {
        match serde_json::from_value::<CachedResponse>(cached) {
            Ok(cached) => {
                debug!(key = %key, "response cache hit");
                return cached.into_hit_response();
            }
            Err(err) => {
                warn!(key = %key, error = %err, "discarding unreadable cached response");
                store.delete_key(&key).await;
            }
        }
    }

    let response = next.run(request).await;
    let cacheable = response.status().is_success()
        && response
            .body()
            .size_hint()
            .upper()
            .is_some_and(|len| len <= state.max_body_bytes as u64);

    if !cacheable {
        return mark_miss(response);
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(err) => {
            error!(key = %key, error = %err, "failed to buffer response body");
            return CacheError::Internal(format!("failed to buffer response body: {}", err))
                .into_response();
        }
    };

    match std::str::from_utf8(&bytes) {
        Ok(text) => {
            let cached = CachedResponse {
                status: parts.status.as_u16(),
                body: text.to_string(),
                content_type: parts
                    .headers
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string),
                timestamp: chrono::Utc::now().timestamp_millis(),
            };
            persist_in_background(store, key, cached, state.ttl);
        }
        Err(_) => debug!(key = %key, "skipping non-UTF-8 response body"),
    }

    mark_miss(Response::from_parts(parts, Body::from(bytes)))
}

fn mark_miss(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(X_CACHE, HeaderValue::from_static("MISS"));
    response
}

fn persist_in_background(store: StoreHandle, key: CacheKey, cached: CachedResponse, ttl: Duration) {
    tokio::spawn(async move {
        match serde_json::to_value(&cached) {
            Ok(value) => {
                store.set_key(key, value, Some(ttl)).await;
            }
            Err(err) => error!(key = %key, error = %err, "failed to encode response for caching"),
        }
    });
}
