/// Request rate limiting
use crate::{
    api::middleware::extract_access_token,
    config::RateLimitSettings,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovernorLimiter,
};
use std::{num::NonZeroU32, sync::Arc};

/// Tiered rate limiter: authenticated callers get a higher budget than
/// anonymous ones
#[derive(Clone)]
pub struct RateLimiter {
    enabled: bool,
    authenticated: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    anonymous: Arc<GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        let auth_quota = Quota::per_second(
            NonZeroU32::new(settings.authenticated_rps).unwrap_or(NonZeroU32::new(100).unwrap()),
        )
        .allow_burst(NonZeroU32::new(settings.burst_size).unwrap_or(NonZeroU32::new(50).unwrap()));

        let anon_quota = Quota::per_second(
            NonZeroU32::new(settings.anonymous_rps).unwrap_or(NonZeroU32::new(10).unwrap()),
        )
        .allow_burst(
            NonZeroU32::new(settings.burst_size / 5).unwrap_or(NonZeroU32::new(10).unwrap()),
        );

        Self {
            enabled: settings.enabled,
            authenticated: Arc::new(GovernorLimiter::direct(auth_quota)),
            anonymous: Arc::new(GovernorLimiter::direct(anon_quota)),
        }
    }

    /// Check rate limit for a caller presenting a credential
    pub fn check_authenticated(&self) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        match self.authenticated.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(ApiError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }),
        }
    }

    /// Check rate limit for an anonymous caller
    pub fn check_anonymous(&self) -> ApiResult<()> {
        if !self.enabled {
            return Ok(());
        }
        match self.anonymous.check() {
            Ok(_) => Ok(()),
            Err(_) => Err(ApiError::RateLimitExceeded {
                retry_after: std::time::Duration::from_secs(1),
            }),
        }
    }
}

/// Rate limiting middleware
///
/// Presence of a credential picks the tier; the credential is not verified
/// here, the session extractor does that on protected routes.
pub async fn rate_limit_middleware(
    State(ctx): State<crate::context::AppContext>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let has_credential = extract_access_token(request.headers()).is_some();

    if has_credential {
        ctx.rate_limiter.check_authenticated()?;
    } else {
        ctx.rate_limiter.check_anonymous()?;
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(authenticated_rps: u32, anonymous_rps: u32, burst_size: u32) -> RateLimitSettings {
        RateLimitSettings {
            enabled: true,
            authenticated_rps,
            anonymous_rps,
            burst_size,
        }
    }

    #[test]
    fn test_limiter_allows_first_requests() {
        let limiter = RateLimiter::new(&settings(100, 10, 50));
        assert!(limiter.check_authenticated().is_ok());
        assert!(limiter.check_anonymous().is_ok());
    }

    #[test]
    fn test_burst_limit_hit() {
        let limiter = RateLimiter::new(&settings(10, 5, 5));

        for _ in 0..5 {
            assert!(limiter.check_authenticated().is_ok());
        }
        assert!(limiter.check_authenticated().is_err());
    }

    #[test]
    fn test_disabled_limiter_never_rejects() {
        let mut s = settings(1, 1, 1);
        s.enabled = false;
        let limiter = RateLimiter::new(&s);

        for _ in 0..100 {
            assert!(limiter.check_anonymous().is_ok());
        }
    }
}
