//! Pluggable retry strategy for dispatch failures.
//!
//! The policy is only ever consulted for failures that happened before any
//! remote code executed ([`DispatchError::is_retryable`]). Anything after
//! the remote accepted the call may already have produced side effects --
//! chat replies, external API calls -- and is never retried automatically.

use std::time::Duration;

use skillforge_types::error::DispatchError;

/// Decides whether (and when) to retry a failed runner call.
pub trait RetryPolicy: Send + Sync {
    /// The delay before retry number `attempt` (1-based: the first retry
    /// after the initial call is attempt 1). `None` exhausts the budget.
    fn next_delay(&self, attempt: u32, error: &DispatchError) -> Option<Duration>;
}

/// Retry up to `max_attempts` extra calls with a fixed delay between them.
#[derive(Debug, Clone)]
pub struct FixedDelayRetry {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl FixedDelayRetry {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

impl Default for FixedDelayRetry {
    fn default() -> Self {
        Self::new(2, Duration::from_millis(250))
    }
}

impl RetryPolicy for FixedDelayRetry {
    fn next_delay(&self, attempt: u32, error: &DispatchError) -> Option<Duration> {
        if !error.is_retryable() || attempt > self.max_attempts {
            return None;
        }
        Some(self.delay)
    }
}

/// A policy that never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn next_delay(&self, _attempt: u32, _error: &DispatchError) -> Option<Duration> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_respects_budget() {
        let policy = FixedDelayRetry::new(2, Duration::from_millis(10));
        let err = DispatchError::Connect("refused".into());

        assert_eq!(policy.next_delay(1, &err), Some(Duration::from_millis(10)));
        assert_eq!(policy.next_delay(2, &err), Some(Duration::from_millis(10)));
        assert_eq!(policy.next_delay(3, &err), None);
    }

    #[test]
    fn post_execution_failures_never_get_a_delay() {
        let policy = FixedDelayRetry::new(5, Duration::from_millis(10));
        assert_eq!(
            policy.next_delay(1, &DispatchError::Endpoint { status: 500 }),
            None
        );
        assert_eq!(
            policy.next_delay(1, &DispatchError::Timeout(Duration::from_secs(1))),
            None
        );
    }
}
