//! API Handlers
//!
//! HTTP request handlers for each cache endpoint. Values travel as JSON and
//! are stored in the selected backend as their serialized text.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::cache::{CacheNamespace, CacheService};
use crate::error::{CacheError, Result};
use crate::models::{
    ClearPatternQuery, ClearResponse, DeleteResponse, ExistsResponse, GetResponse,
    HealthResponse, RateLimitSummary, SetRequest, SetResponse, StatsResponse, TtlResponse,
    UpdateTtlRequest,
};
use crate::ratelimit::RateLimiters;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Backend chosen by the cache factory at startup
    pub cache: Arc<dyn CacheService>,
    /// One limiter per named policy
    pub limiters: RateLimiters,
    /// Trust proxy headers for client identity
    pub behind_proxy: bool,
}

impl AppState {
    pub fn new(cache: Arc<dyn CacheService>, limiters: RateLimiters) -> Self {
        Self {
            cache,
            limiters,
            behind_proxy: false,
        }
    }

    pub fn behind_proxy(mut self, behind_proxy: bool) -> Self {
        self.behind_proxy = behind_proxy;
        self
    }
}

/// Handler for GET /health
///
/// Always answers 200; `status` reports whether the store responds.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let store_ok = state.cache.health_check().await;
    Json(HealthResponse::new(state.cache.backend_name(), store_ok))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats().await;
    let rate_limits = state
        .limiters
        .iter()
        .map(|limiter| RateLimitSummary::from(limiter.as_ref()))
        .collect();

    Json(StatsResponse::new(
        state.cache.backend_name(),
        &stats,
        rate_limits,
    ))
}

/// Handler for GET /cache/:key
///
/// A miss, an expired entry and an unreachable store all answer 404.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let raw = state
        .cache
        .get(&key)
        .await?
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    // Entries written by other clients may not be JSON
    let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for PUT /cache/:key
pub async fn set_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let payload = serde_json::to_string(&req.value)?;
    state.cache.set(&key, &payload, req.ttl).await?;

    Ok(Json(SetResponse::new(key)))
}

/// Handler for DELETE /cache/:key
///
/// Idempotent: deleting an absent key answers 200 with `deleted: false`.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.cache.del(&key).await?;
    Ok(Json(DeleteResponse::new(key, deleted)))
}

/// Handler for GET /cache/:key/exists
pub async fn exists_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<ExistsResponse>> {
    let exists = state.cache.exists(&key).await?;
    Ok(Json(ExistsResponse { key, exists }))
}

/// Handler for GET /cache/:key/ttl
pub async fn ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TtlResponse>> {
    let ttl = state.cache.get_ttl(&key).await?;
    Ok(Json(TtlResponse::new(key, ttl)))
}

/// Handler for PATCH /cache/:key/ttl
pub async fn update_ttl_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<UpdateTtlRequest>,
) -> Result<Json<TtlResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    if !state.cache.update_ttl(&key, req.ttl).await? {
        return Err(CacheError::NotFound(key));
    }

    Ok(Json(TtlResponse::new(key, Some(req.ttl))))
}

/// Handler for DELETE /cache?pattern=...
pub async fn clear_pattern_handler(
    State(state): State<AppState>,
    Query(query): Query<ClearPatternQuery>,
) -> Result<Json<ClearResponse>> {
    let deleted = state.cache.clear_pattern(&query.pattern).await?;
    debug!(pattern = %query.pattern, deleted, "pattern cleared over HTTP");

    Ok(Json(ClearResponse {
        pattern: query.pattern,
        deleted,
    }))
}

/// Handler for DELETE /namespaces/:namespace
///
/// Drops every entry of one domain namespace, e.g. after a bulk import.
pub async fn clear_namespace_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
) -> Result<Json<ClearResponse>> {
    let namespace: CacheNamespace = namespace.parse()?;
    let pattern = namespace.pattern();
    let deleted = state.cache.clear_pattern(&pattern).await?;

    Ok(Json(ClearResponse { pattern, deleted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::ratelimit::RateLimitPolicies;
    use serde_json::json;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(MemoryCache::new(100, 300)),
            RateLimiters::new(RateLimitPolicies::default()),
        )
    }

    async fn put(state: &AppState, key: &str, value: Value, ttl: Option<u64>) {
        set_handler(
            State(state.clone()),
            Path(key.to_string()),
            Json(SetRequest { value, ttl }),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();
        put(&state, "universities:7", json!({"name": "TU Delft"}), None).await;

        let response = get_handler(State(state), Path("universities:7".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!({"name": "TU Delft"}));
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_non_json_payload_is_returned_as_string() {
        let state = test_state();
        state.cache.set("raw", "plain text", None).await.unwrap();

        let response = get_handler(State(state), Path("raw".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, json!("plain text"));
    }

    #[tokio::test]
    async fn test_delete_handler_is_idempotent() {
        let state = test_state();
        put(&state, "to_delete", json!(1), None).await;

        let first = delete_handler(State(state.clone()), Path("to_delete".to_string()))
            .await
            .unwrap();
        assert!(first.deleted);

        let second = delete_handler(State(state), Path("to_delete".to_string()))
            .await
            .unwrap();
        assert!(!second.deleted);
    }

    #[tokio::test]
    async fn test_ttl_handlers() {
        let state = test_state();

        let missing = ttl_handler(State(state.clone()), Path("k".to_string()))
            .await
            .unwrap();
        assert_eq!(missing.ttl, -1);

        put(&state, "k", json!("v"), Some(120)).await;
        let ttl = ttl_handler(State(state.clone()), Path("k".to_string()))
            .await
            .unwrap();
        assert!(ttl.ttl > 0 && ttl.ttl <= 120);

        let updated = update_ttl_handler(
            State(state.clone()),
            Path("k".to_string()),
            Json(UpdateTtlRequest { ttl: 900 }),
        )
        .await
        .unwrap();
        assert_eq!(updated.ttl, 900);
    }

    #[tokio::test]
    async fn test_update_ttl_missing_key() {
        let state = test_state();

        let result = update_ttl_handler(
            State(state),
            Path("ghost".to_string()),
            Json(UpdateTtlRequest { ttl: 60 }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_zero_ttl_rejected() {
        let state = test_state();

        let result = set_handler(
            State(state),
            Path("k".to_string()),
            Json(SetRequest {
                value: json!(1),
                ttl: Some(0),
            }),
        )
        .await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_clear_pattern_and_namespace() {
        let state = test_state();
        put(&state, "tags:1", json!("a"), None).await;
        put(&state, "tags:2", json!("b"), None).await;
        put(&state, "agents:1", json!("c"), None).await;

        let cleared = clear_namespace_handler(State(state.clone()), Path("tags".to_string()))
            .await
            .unwrap();
        assert_eq!(cleared.deleted, 2);
        assert_eq!(cleared.pattern, "tags:*");

        let cleared = clear_pattern_handler(
            State(state.clone()),
            Query(ClearPatternQuery {
                pattern: "agents:*".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(cleared.deleted, 1);

        let unknown = clear_namespace_handler(State(state), Path("courses".to_string())).await;
        assert!(matches!(unknown, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        put(&state, "k", json!(1), None).await;
        let _ = get_handler(State(state.clone()), Path("k".to_string())).await;
        let _ = get_handler(State(state.clone()), Path("missing".to_string())).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 1);
        assert_eq!(response.misses, 1);
        assert_eq!(response.backend, "memory");
        assert_eq!(response.rate_limits.len(), 3);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(test_state())).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.backend, "memory");
    }
}
