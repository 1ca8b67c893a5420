//! Consecutive-failure circuit breaker
//!
//! Closed -> Open after `threshold` consecutive failures. Open rejects every
//! call until the cooldown elapses, then exactly one trial call is admitted
//! (HalfOpen). The trial's outcome closes or reopens the breaker.

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation, calls are permitted.
    Closed,
    /// Calls are rejected until `since + cooldown`.
    Open { since: Instant },
    /// Cooldown elapsed; a single trial call is admitted.
    HalfOpen { trial_in_flight: bool },
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: BreakerState,
    consecutive_failures: u32,
    threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            state: BreakerState::Closed,
            consecutive_failures: 0,
            threshold: threshold.max(1),
            cooldown,
        }
    }

    /// Ask permission for one call. A granted half-open permit must be
    /// followed by `record_success` or `record_failure`.
    pub fn try_acquire(&mut self) -> bool {
        match self.state {
            BreakerState::Closed => true,
            BreakerState::Open { since } => {
                if since.elapsed() >= self.cooldown {
                    debug!("Circuit breaker half-open, admitting trial call");
                    self.state = BreakerState::HalfOpen { trial_in_flight: true };
                    true
                } else {
                    false
                }
            }
            BreakerState::HalfOpen { trial_in_flight: true } => false,
            BreakerState::HalfOpen { trial_in_flight: false } => {
                self.state = BreakerState::HalfOpen { trial_in_flight: true };
                true
            }
        }
    }

    /// Reset the failure count and close.
    pub fn record_success(&mut self) {
        if matches!(self.state, BreakerState::HalfOpen { .. }) {
            debug!("Circuit breaker closing after successful trial");
        }
        self.consecutive_failures = 0;
        self.state = BreakerState::Closed;
    }

    /// Count a failure. Returns true when this failure opened the breaker.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        match self.state {
            BreakerState::HalfOpen { .. } => {
                warn!("Circuit breaker trial failed, reopening");
                self.state = BreakerState::Open { since: Instant::now() };
                true
            }
            BreakerState::Closed if self.consecutive_failures >= self.threshold => {
                warn!(
                    failures = self.consecutive_failures,
                    threshold = self.threshold,
                    "Circuit breaker opening"
                );
                self.state = BreakerState::Open { since: Instant::now() };
                true
            }
            _ => false,
        }
    }

    /// Release a half-open permit without an outcome (e.g. the call was abandoned).
    pub fn release_trial(&mut self) {
        if let BreakerState::HalfOpen { trial_in_flight: true } = self.state {
            self.state = BreakerState::HalfOpen { trial_in_flight: false };
        }
    }

    pub fn state(&self) -> BreakerState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, BreakerState::Open { .. })
    }
}
