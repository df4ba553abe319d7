//! Per-identifier login throttling

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use tracing::warn;

use sso_core::DomainError;
use sso_shared::utils::mask_identifier;

/// Keyed on the normalised login identifier so one account cannot be
/// brute-forced from many origins.
pub struct LoginLimiter {
    inner: DefaultKeyedRateLimiter<String>,
}

impl LoginLimiter {
    pub fn new(attempts_per_minute: u32) -> Self {
        let burst = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: RateLimiter::keyed(Quota::per_minute(burst)),
        }
    }

    pub fn check(&self, identifier: &str) -> Result<(), DomainError> {
        let key = identifier.trim().to_lowercase();
        self.inner.check_key(&key).map_err(|_| {
            warn!(identifier = %mask_identifier(&key), "Login attempts throttled");
            DomainError::TooManyRequests
        })
    }

    /// Forget identifiers whose quota has fully replenished.
    pub fn prune(&self) {
        self.inner.retain_recent();
    }
}
