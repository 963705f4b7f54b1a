//! API Routes
//!
//! Configures the Axum router with all cache endpoints. Each route group sits
//! behind its own rate limit policy.

use axum::{
    middleware,
    routing::{delete, get, patch, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    clear_namespace_handler, clear_pattern_handler, delete_handler, exists_handler, get_handler,
    health_handler, set_handler, stats_handler, ttl_handler, update_ttl_handler, AppState,
};
use crate::ratelimit::{rate_limit, RateLimitState};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// Default policy:
/// - `GET /health`, `GET /stats`
/// - `GET /cache/:key`, `GET /cache/:key/exists`, `GET /cache/:key/ttl`
///
/// Admin policy:
/// - `PUT /cache/:key`, `DELETE /cache/:key`, `PATCH /cache/:key/ttl`
///
/// Strict policy:
/// - `DELETE /cache?pattern=...`, `DELETE /namespaces/:namespace`
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limited = |limiter| RateLimitState::new(limiter, state.behind_proxy);

    let reads = Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/cache/:key", get(get_handler))
        .route("/cache/:key/exists", get(exists_handler))
        .route("/cache/:key/ttl", get(ttl_handler))
        .route_layer(middleware::from_fn_with_state(
            limited(state.limiters.default.clone()),
            rate_limit,
        ));

    let writes = Router::new()
        .route("/cache/:key", put(set_handler).delete(delete_handler))
        .route("/cache/:key/ttl", patch(update_ttl_handler))
        .route_layer(middleware::from_fn_with_state(
            limited(state.limiters.admin.clone()),
            rate_limit,
        ));

    let invalidation = Router::new()
        .route("/cache", delete(clear_pattern_handler))
        .route("/namespaces/:namespace", delete(clear_namespace_handler))
        .route_layer(middleware::from_fn_with_state(
            limited(state.limiters.strict.clone()),
            rate_limit,
        ));

    Router::new()
        .merge(reads)
        .merge(writes)
        .merge(invalidation)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::ratelimit::{RateLimitPolicies, RateLimitPolicy, RateLimiters};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let state = AppState::new(
            Arc::new(MemoryCache::new(100, 300)),
            RateLimiters::new(RateLimitPolicies::default()),
        );
        create_router(state)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_set_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri("/cache/test")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"value":"hello"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cache/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_policies_are_independent() {
        let policies = RateLimitPolicies {
            default: RateLimitPolicy::new("default", 5, Duration::from_secs(60)),
            strict: RateLimitPolicy::new("strict", 1, Duration::from_secs(60)),
            admin: RateLimitPolicy::new("admin", 5, Duration::from_secs(60)),
        };
        let state = AppState::new(
            Arc::new(MemoryCache::new(100, 300)),
            RateLimiters::new(policies),
        )
        .behind_proxy(true);
        let app = create_router(state);

        let clear = || {
            Request::builder()
                .method("DELETE")
                .uri("/cache?pattern=tags:*")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::empty())
                .unwrap()
        };

        let first = app.clone().oneshot(clear()).await.unwrap();
        assert_eq!(first.status(), StatusCode::OK);

        let second = app.clone().oneshot(clear()).await.unwrap();
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);

        // Reads for the same client draw from a separate counter
        let read = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header("x-forwarded-for", "203.0.113.9")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(read.status(), StatusCode::OK);
    }
}
