//! Exponential reconnect backoff.

use std::time::Duration;

/// Bounds for reconnect delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// First delay after a failure, and the delay after a reset.
    pub initial: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(100),
            max: Duration::from_millis(3000),
        }
    }
}

/// Doubling delay, capped at the policy maximum.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    current: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            current: policy.initial.min(policy.max),
        }
    }

    /// The delay to wait now; doubles the next one.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        let next = self.current.checked_mul(2).unwrap_or(self.policy.max);
        self.current = next.min(self.policy.max);
        delay
    }

    /// The delay the next call to [`next_delay`](Self::next_delay) returns.
    pub fn peek(&self) -> Duration {
        self.current
    }

    /// Start over from the initial delay.
    pub fn reset(&mut self) {
        self.current = self.policy.initial.min(self.policy.max);
    }
}
