//! Exponential backoff for failing feeds.
//!
//! A feed is either [`BackoffState::Healthy`] or in
//! [`BackoffState::Backoff`] with a count of consecutive failures. Each
//! failure moves the poll interval to
//! `min(base_retry_delay * multiplier^(n - 1), max_delay)` (30, 60, 120,
//! 240, 480, then 600 seconds with the defaults). One success restores the
//! configured base interval.
//!
//! The controller only computes the next interval. A timer that is already
//! armed is never rescheduled.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Backoff tuning, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffPolicy {
    /// Delay after the first failure.
    pub base_retry_delay: u64,
    /// Growth factor per additional failure.
    pub multiplier: u32,
    /// Upper bound on the delay.
    pub max_delay: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_retry_delay: 30,
            multiplier: 2,
            max_delay: 600,
        }
    }
}

impl BackoffPolicy {
    /// Delay after `failures` consecutive failures. Saturates instead of
    /// overflowing; `failures = 0` is treated as the first failure.
    #[must_use]
    pub fn delay(&self, failures: u32) -> Duration {
        let exponent = failures.saturating_sub(1);
        let factor = u64::from(self.multiplier).saturating_pow(exponent);
        let secs = self
            .base_retry_delay
            .saturating_mul(factor)
            .min(self.max_delay);
        Duration::from_secs(secs)
    }
}

/// Health of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "failures")]
pub enum BackoffState {
    /// Last poll succeeded (or nothing polled yet).
    #[default]
    Healthy,
    /// `n` consecutive failures.
    Backoff(u32),
}

/// Tracks consecutive failures and the resulting poll interval.
#[derive(Debug, Clone)]
pub struct BackoffController {
    policy: BackoffPolicy,
    base_interval: Duration,
    state: BackoffState,
    current_interval: Duration,
}

impl BackoffController {
    /// Creates a healthy controller polling every `base_interval`.
    #[must_use]
    pub const fn new(base_interval: Duration, policy: BackoffPolicy) -> Self {
        Self {
            policy,
            base_interval,
            state: BackoffState::Healthy,
            current_interval: base_interval,
        }
    }

    /// Records a success. Returns `true` if the feed was recovering from
    /// failures (and the interval was reset).
    pub const fn on_success(&mut self) -> bool {
        let recovered = matches!(self.state, BackoffState::Backoff(_));
        self.state = BackoffState::Healthy;
        self.current_interval = self.base_interval;
        recovered
    }

    /// Records a failure and returns the new poll interval.
    pub fn on_failure(&mut self) -> Duration {
        let failures = self.consecutive_failures().saturating_add(1);
        self.state = BackoffState::Backoff(failures);
        self.current_interval = self.policy.delay(failures);
        self.current_interval
    }

    /// Current health.
    #[must_use]
    pub const fn state(&self) -> BackoffState {
        self.state
    }

    /// Consecutive failures (0 when healthy).
    #[must_use]
    pub const fn consecutive_failures(&self) -> u32 {
        match self.state {
            BackoffState::Healthy => 0,
            BackoffState::Backoff(n) => n,
        }
    }

    /// Interval to wait before the next poll.
    #[must_use]
    pub const fn current_interval(&self) -> Duration {
        self.current_interval
    }

    /// Configured interval while healthy.
    #[must_use]
    pub const fn base_interval(&self) -> Duration {
        self.base_interval
    }

    /// The backoff tuning in effect.
    #[must_use]
    pub const fn policy(&self) -> BackoffPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_double_then_cap() {
        let policy = BackoffPolicy::default();
        let secs: Vec<u64> = (1..=7).map(|n| policy.delay(n).as_secs()).collect();
        assert_eq!(secs, vec![30, 60, 120, 240, 480, 600, 600]);
    }

    #[test]
    fn delays_are_monotonic_and_bounded() {
        let policy = BackoffPolicy::default();
        for n in 1..200 {
            let current = policy.delay(n);
            let next = policy.delay(n + 1);
            assert!(current <= next);
            assert!(next <= Duration::from_secs(policy.max_delay));
        }
    }

    #[test]
    fn huge_failure_counts_saturate() {
        let policy = BackoffPolicy {
            base_retry_delay: u64::MAX / 2,
            multiplier: u32::MAX,
            max_delay: u64::MAX,
        };
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn controller_backs_off_and_recovers() {
        let mut controller =
            BackoffController::new(Duration::from_secs(600), BackoffPolicy::default());
        assert_eq!(controller.state(), BackoffState::Healthy);
        assert!(!controller.on_success());

        assert_eq!(controller.on_failure(), Duration::from_secs(30));
        assert_eq!(controller.on_failure(), Duration::from_secs(60));
        assert_eq!(controller.state(), BackoffState::Backoff(2));
        assert_eq!(controller.current_interval(), Duration::from_secs(60));

        assert!(controller.on_success());
        assert_eq!(controller.state(), BackoffState::Healthy);
        assert_eq!(controller.consecutive_failures(), 0);
        assert_eq!(controller.current_interval(), Duration::from_secs(600));
    }

    #[test]
    fn policy_deserializes_with_defaults() {
        let policy: BackoffPolicy = serde_json::from_str(r#"{"max_delay": 300}"#).unwrap();
        assert_eq!(policy.base_retry_delay, 30);
        assert_eq!(policy.multiplier, 2);
        assert_eq!(policy.delay(10), Duration::from_secs(300));
    }
}
