//! Request throttling shared by every route.
//!
//! One token bucket covers the whole server, sized from
//! `AppConfig::rate_limit` (`[rate_limit] requests_per_second` in the TOML
//! file, `STEAMGRAPH_RATE_LIMIT` in the environment). `create_router` skips
//! the layer when the rate is 0, so requests are never counted.

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Fallback when a zero rate reaches [`create_rate_limiter`].
const DEFAULT_RPS: NonZeroU32 = match NonZeroU32::new(100) {
    Some(rps) => rps,
    None => NonZeroU32::MIN,
};

/// Unkeyed limiter handed to the middleware as router state.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Bucket refilling at `requests_per_second`, with a burst of the same size.
pub fn create_rate_limiter(requests_per_second: u32) -> GlobalRateLimiter {
    let rps = NonZeroU32::new(requests_per_second).unwrap_or(DEFAULT_RPS);
    Arc::new(RateLimiter::direct(Quota::per_second(rps)))
}

/// Spend one token per request; an empty bucket answers 429.
pub async fn rate_limit_middleware(
    State(limiter): State<GlobalRateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    match limiter.check() {
        Ok(()) => Ok(next.run(request).await),
        Err(_) => {
            tracing::warn!(path = %request.uri().path(), "request throttled");
            Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_is_capped_at_quota() {
        let limiter = create_rate_limiter(3);
        let allowed = (0..10).filter(|_| limiter.check().is_ok()).count();
        assert_eq!(allowed, 3);
    }

    #[test]
    fn zero_falls_back_to_default() {
        let limiter = create_rate_limiter(0);
        assert!(limiter.check().is_ok());
    }
}
