//! Admission control middleware.
//!
//! Wraps a [`RateLimiter`] as an axum middleware. Admitted responses carry
//! the quota headers; rejected requests never reach the handler and get a
//! 429 with `Retry-After`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::ratelimit::{RateLimitDecision, RateLimitStatus, RateLimiter};

pub const X_RATELIMIT_LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
pub const X_RATELIMIT_REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const X_RATELIMIT_RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// State handed to [`rate_limit`] through `from_fn_with_state`.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    /// Trust `X-Forwarded-For` / `X-Real-IP` for client identity
    pub behind_proxy: bool,
}

impl RateLimitState {
    pub fn new(limiter: Arc<RateLimiter>, behind_proxy: bool) -> Self {
        Self {
            limiter,
            behind_proxy,
        }
    }
}

// == Middleware ==
/// Counts the request against the client's quota.
///
/// A request whose client cannot be identified is let through.
pub async fn rate_limit(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(client) = client_key(&request, state.behind_proxy) else {
        debug!(
            policy = state.limiter.policy().name,
            "no client address, skipping rate limit"
        );
        return next.run(request).await;
    };

    match state.limiter.check(&client) {
        RateLimitDecision::Allowed(status) => {
            let mut response = next.run(request).await;
            apply_headers(response.headers_mut(), &status);
            response
        }
        RateLimitDecision::Rejected(status) => RateLimitRejection(status).into_response(),
    }
}

/// Identifies the client, preferring proxy headers when configured to trust
/// them and falling back to the peer address.
pub fn client_key(request: &Request, behind_proxy: bool) -> Option<String> {
    if behind_proxy {
        let forwarded = header_str(request.headers(), "x-forwarded-for")
            .and_then(|value| value.split(',').next())
            .map(str::trim)
            .filter(|ip| !ip.is_empty());
        let real_ip = header_str(request.headers(), "x-real-ip")
            .map(str::trim)
            .filter(|ip| !ip.is_empty());

        if let Some(ip) = forwarded.or(real_ip) {
            return Some(ip.to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

fn apply_headers(headers: &mut HeaderMap, status: &RateLimitStatus) {
    headers.insert(X_RATELIMIT_LIMIT, HeaderValue::from(status.limit));
    headers.insert(X_RATELIMIT_REMAINING, HeaderValue::from(status.remaining));
    headers.insert(X_RATELIMIT_RESET, HeaderValue::from(status.reset_at_secs()));
}

// == Rejection ==
/// 429 response for a client over its quota.
#[derive(Debug, Clone, Copy)]
pub struct RateLimitRejection(pub RateLimitStatus);

impl IntoResponse for RateLimitRejection {
    fn into_response(self) -> Response {
        let status = self.0;
        let body = Json(json!({
            "error": "Too many requests",
            "retry_after": status.retry_after_secs,
        }));

        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();
        let headers = response.headers_mut();
        apply_headers(headers, &status);
        headers.insert(
            header::RETRY_AFTER,
            HeaderValue::from(status.retry_after_secs),
        );
        response
    }
}
