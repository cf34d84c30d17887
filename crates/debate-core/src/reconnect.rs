//! Bounded reconnect policy.
//!
//! The counter is reset by a successful open and bumped by every abnormal
//! close that schedules a retry. Once it reaches the maximum it stays there
//! until the next successful open.

use std::time::Duration;

use crate::config::{Backoff, ClientConfig};

/// Retry limits and delay schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts allowed before giving up.
    pub max_attempts: u32,
    /// Base delay.
    pub base_delay: Duration,
    /// Delay growth.
    pub backoff: Backoff,
}

impl ReconnectPolicy {
    /// Policy described by `config`.
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            max_attempts: config.max_reconnect_attempts,
            base_delay: config.reconnect_delay,
            backoff: config.backoff,
        }
    }

    /// Delay before attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential { max_delay } => {
                let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
                self.base_delay.saturating_mul(factor).min(max_delay)
            },
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_config(&ClientConfig::default())
    }
}

/// Attempt counter under a [`ReconnectPolicy`].
#[derive(Debug, Clone)]
pub struct ReconnectState {
    policy: ReconnectPolicy,
    attempts: u32,
}

impl ReconnectState {
    /// Fresh counter.
    #[must_use]
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self { policy, attempts: 0 }
    }

    /// Attempts made since the last successful open.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Active policy.
    #[must_use]
    pub fn policy(&self) -> &ReconnectPolicy {
        &self.policy
    }

    /// Whether no further attempts will be scheduled.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.policy.max_attempts
    }

    /// Successful open.
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Use up the budget so no retry follows.
    pub fn exhaust(&mut self) {
        self.attempts = self.policy.max_attempts;
    }

    /// Claim the next attempt.
    ///
    /// Returns the delay to wait, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.is_exhausted() {
            return None;
        }
        self.attempts += 1;
        Some(self.policy.delay_for(self.attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_allows_exactly_max_attempts() {
        let mut state = ReconnectState::new(ReconnectPolicy::default());

        let delays: Vec<_> = std::iter::from_fn(|| state.next_delay()).collect();

        assert_eq!(delays, vec![Duration::from_secs(3); 5]);
        assert_eq!(state.attempts(), 5);
        assert_eq!(state.next_delay(), None);
        assert_eq!(state.attempts(), 5);
    }

    #[test]
    fn reset_restores_budget() {
        let mut state = ReconnectState::new(ReconnectPolicy::default());
        state.exhaust();
        assert!(state.is_exhausted());

        state.reset();
        assert_eq!(state.attempts(), 0);
        assert!(state.next_delay().is_some());
    }

    #[test]
    fn zero_max_never_retries() {
        let policy = ReconnectPolicy { max_attempts: 0, ..ReconnectPolicy::default() };
        let mut state = ReconnectState::new(policy);
        assert_eq!(state.next_delay(), None);
    }

    #[test]
    fn exponential_doubles_and_caps() {
        let policy = ReconnectPolicy {
            max_attempts: 6,
            base_delay: Duration::from_secs(1),
            backoff: Backoff::Exponential { max_delay: Duration::from_secs(10) },
        };

        let delays: Vec<_> = (1..=6).map(|n| policy.delay_for(n).as_secs()).collect();

        assert_eq!(delays, vec![1, 2, 4, 8, 10, 10]);
    }

    #[test]
    fn exponential_saturates_on_huge_attempts() {
        let policy = ReconnectPolicy {
            max_attempts: u32::MAX,
            base_delay: Duration::from_secs(3),
            backoff: Backoff::Exponential { max_delay: Duration::from_secs(60) },
        };
        assert_eq!(policy.delay_for(u32::MAX), Duration::from_secs(60));
    }
}
