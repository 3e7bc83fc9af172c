//! Reconnect policy for the push channel

use std::time::Duration;

use quizsync_shared_config::SessionTiming;

/// Reconnect budget and backoff schedule
///
/// `attempt` counts reconnects scheduled since the last successful open.
/// The delay for attempt `n` (1-based) is `min(cap, base * 2^(n-1))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    attempt: u32,
    max_attempts: u32,
    base: Duration,
    cap: Duration,
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, base: Duration, cap: Duration) -> Self {
        Self {
            attempt: 0,
            max_attempts,
            base,
            cap,
        }
    }

    pub fn from_timing(timing: &SessionTiming) -> Self {
        Self::new(
            timing.max_reconnect_attempts,
            timing.backoff_base,
            timing.backoff_cap,
        )
    }

    /// Delay before reconnect attempt `attempt`; pure in its inputs
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let factor = 1u32 << exponent;
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Reconnects scheduled since the last successful open
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether another reconnect may be scheduled
    pub fn can_retry(&self) -> bool {
        self.attempt < self.max_attempts
    }

    /// Count a failure and return the delay before the next attempt
    ///
    /// Returns `None` once the budget is spent; the counter is left at the cap.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if !self.can_retry() {
            return None;
        }
        self.attempt += 1;
        Some(self.backoff(self.attempt))
    }

    /// Forget previous failures after a successful open
    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::from_timing(&SessionTiming::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, 500)]
    #[case(2, 1_000)]
    #[case(3, 2_000)]
    #[case(4, 4_000)]
    #[case(5, 8_000)]
    #[case(6, 10_000)]
    #[case(40, 10_000)]
    fn test_backoff_schedule(#[case] attempt: u32, #[case] expected_ms: u64) {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.backoff(attempt), Duration::from_millis(expected_ms));
    }

    #[test]
    fn test_backoff_is_pure() {
        let policy = ReconnectPolicy::default();
        for n in 1..=5 {
            let expected = Duration::from_millis((500u64 << (n - 1)).min(10_000));
            assert_eq!(policy.backoff(n), expected);
            assert_eq!(policy.backoff(n), policy.backoff(n));
        }
    }

    #[test]
    fn test_budget_exhausts_after_max_attempts() {
        let mut policy = ReconnectPolicy::default();
        let delays: Vec<_> = std::iter::from_fn(|| policy.next_delay()).collect();

        assert_eq!(delays.len(), 5);
        assert_eq!(delays[0], Duration::from_millis(500));
        assert_eq!(delays[4], Duration::from_millis(8_000));
        assert!(!policy.can_retry());
        assert_eq!(policy.attempt(), 5);
        assert_eq!(policy.next_delay(), None);
    }

    #[test]
    fn test_reset_restores_budget() {
        let mut policy = ReconnectPolicy::default();
        policy.next_delay();
        policy.next_delay();
        policy.reset();

        assert_eq!(policy.attempt(), 0);
        assert_eq!(policy.next_delay(), Some(Duration::from_millis(500)));
    }
}
