//! Per-caller rate limiting middleware.
//!
//! Sliding-window limits keyed by bearer-token prefix; unauthenticated
//! requests share the `anonymous` bucket.

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::error::ApiError;
use crate::api::middleware::auth::bearer_token;
use crate::api::types::ApiContext;

const TOKEN_KEY_CHARS: usize = 16;

fn rate_key(req: &Request<Body>) -> String {
    match bearer_token(req) {
        Some(token) => format!("token:{}", token.chars().take(TOKEN_KEY_CHARS).collect::<String>()),
        None => "anonymous".to_string(),
    }
}

/// 429 with `Retry-After` once the caller's window is full.
pub async fn limit(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let ctx = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or_else(|| ApiError::Internal("missing API context".into()))?;
    let key = rate_key(&req);

    // The guard must be gone before the handler is awaited.
    let verdict = match ctx.rate_limiter.lock() {
        Ok(mut limiter) => limiter.check(&key),
        Err(_) => return Err(ApiError::Internal("rate limiter lock poisoned".into())),
    };
    if let Err(retry_after) = verdict {
        tracing::warn!(retry_after, anonymous = key == "anonymous", "Rate limit exceeded");
        return Err(ApiError::RateLimited { retry_after });
    }

    Ok(next.run(req).await)
}
