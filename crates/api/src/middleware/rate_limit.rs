//! Rate limiting middleware.
//!
//! Provides per-client-IP rate limiting using governor's GCRA limiter.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{clock::Clock, DefaultKeyedRateLimiter, Quota, RateLimiter};
use serde_json::json;
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
};

use crate::app::AppState;

/// Default quota when the configured limit is zero.
const FALLBACK_LIMIT_PER_MINUTE: NonZeroU32 = match NonZeroU32::new(60) {
    Some(n) => n,
    None => unreachable!(),
};

/// Bucket shared by requests whose peer address is unknown.
const UNKNOWN_CLIENT: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Rate limiter state shared across all requests, one GCRA cell per client IP.
pub struct RateLimiterState {
    limiter: DefaultKeyedRateLimiter<IpAddr>,
    rate_limit_per_minute: u32,
    trust_forwarded_for: bool,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the specified limit per minute.
    pub fn new(rate_limit_per_minute: u32, trust_forwarded_for: bool) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(rate_limit_per_minute).unwrap_or(FALLBACK_LIMIT_PER_MINUTE),
        );
        Self {
            limiter: RateLimiter::keyed(quota),
            rate_limit_per_minute,
            trust_forwarded_for,
        }
    }

    /// Check if a request from the given client should be allowed.
    /// Returns Ok(()) if allowed, or Err with retry_after seconds if rate limited.
    pub fn check(&self, client: IpAddr) -> Result<(), u64> {
        self.limiter.check_key(&client).map_err(|not_until| {
            let wait_time = not_until.wait_time_from(self.limiter.clock().now());
            wait_time.as_secs().max(1)
        })
    }

    /// Client key for a request: the peer address, or the first
    /// `X-Forwarded-For` hop when the deployment sits behind a trusted proxy.
    pub fn client_key(&self, headers: &HeaderMap, peer: Option<SocketAddr>) -> IpAddr {
        client_key(headers, peer, self.trust_forwarded_for)
    }

    /// Drops cells for clients that are back at full capacity.
    pub fn prune(&self) -> usize {
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        self.limiter.len()
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("rate_limit_per_minute", &self.rate_limit_per_minute)
            .field("trust_forwarded_for", &self.trust_forwarded_for)
            .field("active_limiters", &self.limiter.len())
            .finish()
    }
}

/// Resolves the rate limit key. `X-Forwarded-For` is only read when
/// `trust_forwarded_for` is set, and only a hop that parses as an IP counts.
pub fn client_key(
    headers: &HeaderMap,
    peer: Option<SocketAddr>,
    trust_forwarded_for: bool,
) -> IpAddr {
    let forwarded = trust_forwarded_for
        .then(|| {
            headers
                .get("X-Forwarded-For")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        })
        .flatten();

    forwarded
        .or_else(|| peer.map(|addr| addr.ip()))
        .unwrap_or(UNKNOWN_CLIENT)
}

/// Middleware that applies rate limiting per client IP.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(ref rate_limiter) = state.rate_limiter {
        let peer = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let client = rate_limiter.client_key(req.headers(), peer);

        if let Err(retry_after) = rate_limiter.check(client) {
            tracing::debug!(client = %client, retry_after, "Rate limit exceeded");
            return rate_limited_response(state.config.security.rate_limit_per_minute, retry_after);
        }
    }

    next.run(req).await
}

/// Create a rate limited response with proper headers and body.
fn rate_limited_response(limit: u32, retry_after: u64) -> Response {
    let body = json!({
        "error": "rate_limited",
        "message": format!("Rate limit of {} requests/minute exceeded", limit),
        "retry_after": retry_after
    });

    let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::RETRY_AFTER, HeaderValue::from(retry_after));

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("X-Forwarded-For", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_rate_limiter_allows_requests() {
        let state = RateLimiterState::new(100, false);
        assert!(state.check(ip("10.0.0.1")).is_ok());
    }

    #[test]
    fn test_rate_limiter_exhaustion() {
        let state = RateLimiterState::new(1, false);

        assert!(state.check(ip("10.0.0.1")).is_ok());

        let result = state.check(ip("10.0.0.1"));
        assert!(result.is_err());
        assert!(result.unwrap_err() >= 1);
    }

    #[test]
    fn test_rate_limiter_clients_independent() {
        let state = RateLimiterState::new(1, false);

        assert!(state.check(ip("10.0.0.1")).is_ok());
        assert!(state.check(ip("10.0.0.2")).is_ok());

        assert!(state.check(ip("10.0.0.1")).is_err());
        assert!(state.check(ip("10.0.0.2")).is_err());
    }

    #[test]
    fn test_rate_limiter_zero_uses_fallback_quota() {
        let state = RateLimiterState::new(0, false);
        for i in 0..60 {
            assert!(state.check(ip("10.0.0.1")).is_ok(), "Request {} should be allowed", i);
        }
        assert!(state.check(ip("10.0.0.1")).is_err());
    }

    #[test]
    fn test_rate_limiter_state_debug() {
        let state = RateLimiterState::new(100, false);
        state.check(ip("10.0.0.1")).unwrap();
        let debug = format!("{:?}", state);
        assert!(debug.contains("rate_limit_per_minute"));
        assert!(debug.contains("active_limiters"));
    }

    #[test]
    fn test_forwarded_for_ignored_without_trusted_proxy() {
        let state = RateLimiterState::new(1, false);
        let peer: SocketAddr = "198.51.100.4:5000".parse().unwrap();

        let mut allowed = 0;
        for i in 0..1000u32 {
            let spoofed = format!("203.0.{}.{}", i / 256, i % 256);
            let mut headers = HeaderMap::new();
            headers.insert("X-Forwarded-For", HeaderValue::from_str(&spoofed).unwrap());
            if state.check(state.client_key(&headers, Some(peer))).is_ok() {
                allowed += 1;
            }
        }

        assert_eq!(allowed, 1);
        assert_eq!(state.tracked_clients(), 1);
    }

    #[test]
    fn test_client_key_uses_forwarded_for_behind_trusted_proxy() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let headers = forwarded("203.0.113.7, 10.0.0.1");
        assert_eq!(client_key(&headers, Some(peer), true), ip("203.0.113.7"));
        assert_eq!(client_key(&headers, Some(peer), false), ip("10.0.0.9"));
    }

    #[test]
    fn test_client_key_rejects_unparseable_forwarded_for() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let headers = forwarded("not-an-address");
        assert_eq!(client_key(&headers, Some(peer), true), ip("10.0.0.9"));
    }

    #[test]
    fn test_client_key_falls_back_to_peer() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        assert_eq!(client_key(&HeaderMap::new(), Some(peer), false), ip("10.0.0.9"));
        assert_eq!(client_key(&HeaderMap::new(), None, false), UNKNOWN_CLIENT);
    }

    #[test]
    fn test_prune_keeps_clients_still_limited() {
        let state = RateLimiterState::new(1, false);
        state.check(ip("10.0.0.1")).unwrap();
        state.check(ip("10.0.0.2")).unwrap();

        // Both cells are a minute away from full capacity.
        assert_eq!(state.prune(), 2);
    }

    #[test]
    fn test_rate_limited_response_format() {
        let response = rate_limited_response(100, 60);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "60");
    }
}
