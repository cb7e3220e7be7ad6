//! Process-wide gate on external model calls.
//!
//! One `RateLimiter` is built per pass and cloned into every task family.
//! Clones share a single token bucket holding one permit, refilled once per
//! delay, so the bound is on total calls across all families.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::Quota;
use tokio_util::sync::CancellationToken;

use jotter_core::{Error, Result};

type DirectLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Shared token-bucket limiter. A zero delay disables limiting.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Option<Arc<DirectLimiter>>,
    delay: Duration,
}

impl RateLimiter {
    pub fn new(delay: Duration) -> Self {
        let inner = Quota::with_period(delay)
            .map(|quota| quota.allow_burst(NonZeroU32::MIN))
            .map(|quota| Arc::new(governor::RateLimiter::direct(quota)));
        Self { inner, delay }
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_unlimited(&self) -> bool {
        self.inner.is_none()
    }

    /// Wait for one permit.
    ///
    /// Returns `Error::Cancelled` as soon as `cancel` fires, whether it fired
    /// before the call or during the wait.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let Some(limiter) = &self.inner else {
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            _ = limiter.until_ready() => Ok(()),
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("delay", &self.delay)
            .field("unlimited", &self.is_unlimited())
            .finish()
    }
}
