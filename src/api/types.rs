//! Shared types for the HTTP API layer.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::extract::{FromRequest, FromRequestParts};
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::models::User;

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all API routes and middleware.
/// Wraps `CoreState` plus API-specific caches.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
    pub rate_limiter: Arc<Mutex<RateLimiter>>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self::with_rate_limiter(core, RateLimiter::new())
    }

    pub fn with_rate_limiter(core: Arc<CoreState>, limiter: RateLimiter) -> Self {
        Self {
            core,
            rate_limiter: Arc::new(Mutex::new(limiter)),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Caller context: injected by auth middleware
// ═══════════════════════════════════════════════════════════

/// Authenticated caller, injected into request extensions by the auth
/// middleware after the bearer token resolved to a profile.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub user: User,
    pub token: String,
}

// ═══════════════════════════════════════════════════════════
// JSON extractor with API-shaped rejections
// ═══════════════════════════════════════════════════════════

/// `axum::Json` whose rejections render as `ApiError` bodies.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with the same rejection shape.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

impl<T: serde::Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

// ═══════════════════════════════════════════════════════════
// Rate limiter: per-caller sliding window
// ═══════════════════════════════════════════════════════════

const MINUTE: Duration = Duration::from_secs(60);
const HOUR: Duration = Duration::from_secs(3600);
/// Idle keys are swept once the map grows past this.
const MAX_TRACKED_KEYS: usize = 10_000;

/// Sliding-window limiter keyed by caller. Each key keeps the instants of
/// its admitted requests from the last hour, oldest first.
pub struct RateLimiter {
    hits: HashMap<String, VecDeque<Instant>>,
    per_minute: usize,
    per_hour: usize,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::with_limits(120, 2000)
    }

    pub fn with_limits(per_minute: usize, per_hour: usize) -> Self {
        Self {
            hits: HashMap::new(),
            per_minute,
            per_hour,
        }
    }

    /// Admit one request for `key`, or return the seconds until a slot frees up.
    pub fn check(&mut self, key: &str) -> Result<(), u64> {
        if self.hits.len() > MAX_TRACKED_KEYS {
            self.prune();
        }
        self.check_at(key, Instant::now())
    }

    fn check_at(&mut self, key: &str, now: Instant) -> Result<(), u64> {
        let hits = self.hits.entry(key.to_string()).or_default();
        while hits.front().is_some_and(|t| now.duration_since(*t) >= HOUR) {
            hits.pop_front();
        }

        if hits.len() >= self.per_hour {
            return Err(retry_after(hits, hits.len() - self.per_hour, HOUR, now));
        }
        let recent_start = hits.partition_point(|t| now.duration_since(*t) >= MINUTE);
        let recent = hits.len() - recent_start;
        if recent >= self.per_minute {
            let oldest = recent_start + (recent - self.per_minute);
            return Err(retry_after(hits, oldest, MINUTE, now));
        }

        hits.push_back(now);
        Ok(())
    }

    /// Drop keys with no hits in the last hour.
    pub fn prune(&mut self) {
        let now = Instant::now();
        self.hits
            .retain(|_, hits| hits.back().is_some_and(|t| now.duration_since(*t) < HOUR));
    }
}

/// Whole seconds until `hits[index]` leaves `window`, at least 1.
fn retry_after(hits: &VecDeque<Instant>, index: usize, window: Duration, now: Instant) -> u64 {
    let elapsed = hits
        .get(index)
        .map(|t| now.duration_since(*t))
        .unwrap_or_default();
    window.saturating_sub(elapsed).as_secs().max(1)
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_under_limit() {
        let mut limiter = RateLimiter::new();
        assert!(limiter.check("token:a").is_ok());
        assert!(limiter.check("token:a").is_ok());
    }

    #[test]
    fn minute_window_blocks_then_reopens() {
        let mut limiter = RateLimiter::with_limits(2, 1000);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start + Duration::from_secs(10)).is_ok());

        let blocked = limiter.check_at("k", start + Duration::from_secs(20));
        assert_eq!(blocked, Err(40));

        assert!(limiter.check_at("k", start + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn hour_window_blocks() {
        let mut limiter = RateLimiter::with_limits(100, 2);
        let start = Instant::now();
        assert!(limiter.check_at("k", start).is_ok());
        assert!(limiter.check_at("k", start + Duration::from_secs(120)).is_ok());
        assert_eq!(
            limiter.check_at("k", start + Duration::from_secs(600)),
            Err(3000)
        );
    }

    #[test]
    fn callers_are_isolated() {
        let mut limiter = RateLimiter::with_limits(1, 1000);
        assert!(limiter.check("token:a").is_ok());
        assert!(limiter.check("token:b").is_ok());
        assert!(limiter.check("token:a").is_err());
    }

    #[test]
    fn prune_keeps_active_keys() {
        let mut limiter = RateLimiter::with_limits(10, 10);
        limiter.check("token:a").unwrap();
        limiter.prune();
        assert!(limiter.hits.contains_key("token:a"));
    }
}
