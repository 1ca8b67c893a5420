//! Per-source request pacing
//!
//! One GCRA cell per source: the period is the minimum interval and the
//! burst is one, so consecutive calls are spaced by at least `min`. Each wait
//! adds up to `max - min` of jitter.

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Jitter, Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::time::Duration;

pub struct SourceLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    jitter: Duration,
}

impl SourceLimiter {
    /// `None` when `min` is zero, meaning the source is not paced.
    pub fn new(min: Duration, max: Duration) -> Option<Self> {
        let quota = Quota::with_period(min)?.allow_burst(NonZeroU32::MIN);
        Some(Self {
            limiter: RateLimiter::direct(quota),
            jitter: max.saturating_sub(min),
        })
    }

    /// Wait until the source may be called again.
    pub async fn until_ready(&self) {
        if self.jitter.is_zero() {
            self.limiter.until_ready().await;
        } else {
            self.limiter
                .until_ready_with_jitter(Jitter::up_to(self.jitter))
                .await;
        }
    }
}

impl std::fmt::Debug for SourceLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceLimiter")
            .field("jitter", &self.jitter)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_zero_interval_disables_pacing() {
        assert!(SourceLimiter::new(Duration::ZERO, Duration::from_millis(5)).is_none());
    }

    #[tokio::test]
    async fn test_calls_are_spaced_by_min_interval() {
        let limiter = SourceLimiter::new(Duration::from_millis(40), Duration::from_millis(40)).unwrap();
        let start = Instant::now();
        limiter.until_ready().await;
        limiter.until_ready().await;
        limiter.until_ready().await;
        assert!(start.elapsed() >= Duration::from_millis(75));
    }
}
