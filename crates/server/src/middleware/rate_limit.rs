//! Per-key token bucket rate limiting.
//!
//! Authenticated requests are keyed by organization, anything else by peer
//! address. Buckets start full, refill continuously and are pruned once they
//! have been idle long enough to be full again.

use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::warn;

use crate::{AppState, auth::RequestContext, config::RateLimitConfig, error::ApiError};

#[derive(Debug, Clone, Copy)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

pub struct RateLimiter {
    buckets: DashMap<String, Bucket>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        self.allow_at(key, Instant::now())
    }

    /// Take one token for `key` as of `now`.
    pub fn allow_at(&self, key: &str, now: Instant) -> bool {
        let cfg = self.config;
        let mut bucket = self.buckets.entry(key.to_string()).or_insert(Bucket {
            tokens: cfg.capacity,
            last_refill: now,
        });
        let elapsed = now.saturating_duration_since(bucket.last_refill).as_secs_f64();
        bucket.last_refill = now;
        bucket.tokens = (bucket.tokens + elapsed * cfg.refill_per_sec).min(cfg.capacity);
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    /// Time for an empty bucket to refill completely. Saturates at
    /// `Duration::MAX` for refill rates too slow to represent.
    pub fn idle_ttl(&self) -> Duration {
        Duration::try_from_secs_f64(self.config.capacity / self.config.refill_per_sec)
            .unwrap_or(Duration::MAX)
    }

    /// Drop buckets untouched for longer than [`Self::idle_ttl`]. Returns the
    /// number removed.
    pub fn prune(&self, now: Instant) -> usize {
        let ttl = self.idle_ttl();
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_refill) < ttl);
        before - self.buckets.len()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

fn rate_limit_key(request: &Request) -> String {
    if let Some(ctx) = request.extensions().get::<RequestContext>() {
        return format!("org:{}", ctx.organization_id);
    }
    match request.extensions().get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(addr)) => format!("ip:{}", addr.ip()),
        None => "unknown".to_string(),
    }
}

pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let key = rate_limit_key(&request);
    if !state.rate_limiter.allow(&key) {
        warn!(%key, "rate limit exceeded");
        return ApiError::TooManyRequests.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(capacity: f64, refill_per_sec: f64) -> RateLimiter {
        RateLimiter::new(RateLimitConfig {
            capacity,
            refill_per_sec,
        })
    }

    #[test]
    fn test_burst_then_reject() {
        let limiter = limiter(3.0, 1.0);
        let now = Instant::now();
        assert!(limiter.allow_at("org:a", now));
        assert!(limiter.allow_at("org:a", now));
        assert!(limiter.allow_at("org:a", now));
        assert!(!limiter.allow_at("org:a", now));
        // Other keys have their own bucket.
        assert!(limiter.allow_at("org:b", now));
    }

    #[test]
    fn test_refill_over_time() {
        let limiter = limiter(2.0, 2.0);
        let start = Instant::now();
        assert!(limiter.allow_at("k", start));
        assert!(limiter.allow_at("k", start));
        assert!(!limiter.allow_at("k", start));

        let later = start + Duration::from_millis(500);
        assert!(limiter.allow_at("k", later));
        assert!(!limiter.allow_at("k", later));
    }

    #[test]
    fn test_refill_caps_at_capacity() {
        let limiter = limiter(2.0, 10.0);
        let start = Instant::now();
        assert!(limiter.allow_at("k", start));

        let later = start + Duration::from_secs(60);
        assert!(limiter.allow_at("k", later));
        assert!(limiter.allow_at("k", later));
        assert!(!limiter.allow_at("k", later));
    }

    #[test]
    fn test_prune_idle_buckets() {
        let limiter = limiter(4.0, 2.0);
        let start = Instant::now();
        limiter.allow_at("old", start);
        limiter.allow_at("fresh", start + Duration::from_secs(2));
        assert_eq!(limiter.len(), 2);

        assert_eq!(limiter.prune(start + Duration::from_secs(3)), 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_idle_ttl_saturates() {
        let limiter = limiter(1_000_000.0, 1e-300);
        assert_eq!(limiter.idle_ttl(), Duration::MAX);

        let start = Instant::now();
        limiter.allow_at("k", start);
        assert_eq!(limiter.prune(start + Duration::from_secs(3600)), 0);
        assert_eq!(limiter.len(), 1);
    }
}
