//! Per-user rate limiting for nudge generation.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::{Clock, DefaultClock},
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
};
use parking_lot::Mutex;

use super::auth::AuthenticatedUser;
use crate::AppState;
use crate::api::error::ApiError;

pub type UserRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// One limiter per user id, created on first use.
pub struct UserRateLimiters {
    limiters: Mutex<HashMap<String, Arc<UserRateLimiter>>>,
    quota: Quota,
    clock: DefaultClock,
}

impl std::fmt::Debug for UserRateLimiters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRateLimiters")
            .field("users", &self.limiters.lock().len())
            .field("quota", &self.quota)
            .finish()
    }
}

impl UserRateLimiters {
    /// Zero values are raised to one.
    pub fn new(requests_per_minute: u32, burst: u32) -> Self {
        let per_minute = NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst).unwrap_or(NonZeroU32::MIN);

        Self {
            limiters: Mutex::new(HashMap::new()),
            quota: Quota::per_minute(per_minute).allow_burst(burst),
            clock: DefaultClock::default(),
        }
    }

    pub fn get_or_create(&self, user_id: &str) -> Arc<UserRateLimiter> {
        let mut limiters = self.limiters.lock();
        let limiter = limiters
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(RateLimiter::direct(self.quota)));
        Arc::clone(limiter)
    }

    /// Take one cell for `user_id`, or the whole seconds until one is free.
    pub fn check(&self, user_id: &str) -> Result<(), u64> {
        let limiter = self.get_or_create(user_id);
        limiter.check().map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            wait.as_secs().max(1)
        })
    }
}

/// Reject callers that exceed their quota with 429.
///
/// Must run inside [`super::auth::auth_middleware`].
pub async fn user_rate_limit_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = req
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|u| u.user_id.clone())
        .ok_or(ApiError::Unauthorized)?;

    if let Err(retry_after_secs) = state.rate_limiters.check(&user_id) {
        tracing::warn!(
            "🚦 Rate limit exceeded - user_id={}, retry_after_secs={}",
            user_id,
            retry_after_secs
        );
        return Err(ApiError::RateLimited { retry_after_secs });
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_then_reject() {
        let limiters = UserRateLimiters::new(1, 2);
        assert!(limiters.check("alice").is_ok());
        assert!(limiters.check("alice").is_ok());
        let retry = limiters.check("alice").unwrap_err();
        assert!(retry >= 1);
    }

    #[test]
    fn test_users_are_isolated() {
        let limiters = UserRateLimiters::new(1, 1);
        assert!(limiters.check("alice").is_ok());
        assert!(limiters.check("alice").is_err());
        assert!(limiters.check("bob").is_ok());
    }

    #[test]
    fn test_zero_quota_is_clamped() {
        let limiters = UserRateLimiters::new(0, 0);
        assert!(limiters.check("alice").is_ok());
        assert!(limiters.check("alice").is_err());
    }
}
