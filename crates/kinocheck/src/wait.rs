//! Bounded-wait policy and the single poll loop every wait goes through.
//!
//! One cadence, no backoff, no retry after expiry. A wait either observes its
//! condition within the timeout or fails with a timeout-kind error; expiry is
//! detected no later than one poll interval past the deadline.

use std::time::{Duration, Instant};

use crate::result::{KinocheckError, KinocheckResult};

/// Default timeout for bounded waits (10 seconds)
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Default polling interval (250ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default settle delay after state-changing actions (1 second)
pub const DEFAULT_SETTLE_MS: u64 = 1_000;

/// Wait policy: timeout, poll cadence and post-action settle delay.
///
/// Process-wide defaults with per-call override via the builders. Unit tests
/// drop the delays to keep polling deterministic and fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
    /// Settle delay after state-changing actions, in milliseconds
    pub settle_ms: u64,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_ms: DEFAULT_SETTLE_MS,
        }
    }
}

impl WaitPolicy {
    /// Create a policy with the process-wide defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Policy with all delays stripped, for unit tests
    #[must_use]
    pub const fn no_delays() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            poll_interval_ms: 1,
            settle_ms: 0,
        }
    }

    /// Set the timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set the polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set the settle delay in milliseconds
    #[must_use]
    pub const fn with_settle(mut self, settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Get the timeout as a Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get the poll interval as a Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Poll a predicate at the policy cadence until it holds or the timeout expires.
///
/// Returns the elapsed time on success.
///
/// # Errors
///
/// Returns [`KinocheckError::Timeout`] when the predicate never held within the
/// timeout window.
pub fn wait_until<F>(mut predicate: F, policy: &WaitPolicy) -> KinocheckResult<Duration>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    loop {
        if predicate() {
            return Ok(start.elapsed());
        }
        if start.elapsed() >= policy.timeout() {
            return Err(KinocheckError::Timeout {
                ms: policy.timeout_ms,
            });
        }
        std::thread::sleep(policy.poll_interval());
    }
}

/// Poll a probe until it yields a value or the timeout expires.
///
/// # Errors
///
/// Returns [`KinocheckError::Timeout`] when the probe never yielded within the
/// timeout window.
pub fn poll_for<T, F>(mut probe: F, policy: &WaitPolicy) -> KinocheckResult<T>
where
    F: FnMut() -> Option<T>,
{
    let start = Instant::now();
    loop {
        if let Some(value) = probe() {
            return Ok(value);
        }
        if start.elapsed() >= policy.timeout() {
            return Err(KinocheckError::Timeout {
                ms: policy.timeout_ms,
            });
        }
        std::thread::sleep(policy.poll_interval());
    }
}

/// Sleep for the policy's full settle delay. No-op when configured to zero.
pub fn settle(policy: &WaitPolicy) {
    if policy.settle_ms > 0 {
        std::thread::sleep(Duration::from_millis(policy.settle_ms));
    }
}

/// Sleep for half the settle delay, used after scroll adjustments.
pub fn settle_brief(policy: &WaitPolicy) {
    if policy.settle_ms > 0 {
        std::thread::sleep(Duration::from_millis(policy.settle_ms / 2));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    mod policy_tests {
        use super::*;

        #[test]
        fn test_policy_default() {
            let policy = WaitPolicy::default();
            assert_eq!(policy.timeout_ms, DEFAULT_TIMEOUT_MS);
            assert_eq!(policy.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
            assert_eq!(policy.settle_ms, DEFAULT_SETTLE_MS);
        }

        #[test]
        fn test_policy_builders() {
            let policy = WaitPolicy::new()
                .with_timeout(3000)
                .with_poll_interval(100)
                .with_settle(0);
            assert_eq!(policy.timeout_ms, 3000);
            assert_eq!(policy.poll_interval_ms, 100);
            assert_eq!(policy.settle_ms, 0);
        }

        #[test]
        fn test_policy_durations() {
            let policy = WaitPolicy::new().with_timeout(2500);
            assert_eq!(policy.timeout(), Duration::from_millis(2500));
            assert_eq!(
                policy.poll_interval(),
                Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)
            );
        }

        #[test]
        fn test_no_delays_strips_settle() {
            let policy = WaitPolicy::no_delays();
            assert_eq!(policy.settle_ms, 0);
            assert_eq!(policy.poll_interval_ms, 1);
        }
    }

    mod wait_until_tests {
        use super::*;

        #[test]
        fn test_immediate_success() {
            let policy = WaitPolicy::no_delays().with_timeout(100);
            let elapsed = wait_until(|| true, &policy).unwrap();
            assert!(elapsed < Duration::from_millis(100));
        }

        #[test]
        fn test_eventual_success() {
            let policy = WaitPolicy::no_delays().with_timeout(500);
            let mut calls = 0;
            let result = wait_until(
                || {
                    calls += 1;
                    calls >= 3
                },
                &policy,
            );
            assert!(result.is_ok());
            assert_eq!(calls, 3);
        }

        #[test]
        fn test_timeout_error_kind() {
            let policy = WaitPolicy::no_delays().with_timeout(30);
            let result = wait_until(|| false, &policy);
            match result {
                Err(KinocheckError::Timeout { ms }) => assert_eq!(ms, 30),
                other => panic!("expected Timeout, got {other:?}"),
            }
        }

        #[test]
        fn test_timeout_window_bounds() {
            // Expiry lands in [timeout, timeout + poll interval]
            let policy = WaitPolicy::no_delays().with_timeout(50).with_poll_interval(10);
            let start = Instant::now();
            let result = wait_until(|| false, &policy);
            let elapsed = start.elapsed();
            assert!(result.is_err());
            assert!(elapsed >= Duration::from_millis(50));
            // Generous ceiling to absorb scheduler jitter
            assert!(elapsed < Duration::from_millis(200));
        }

        #[test]
        fn test_no_retry_after_timeout() {
            let policy = WaitPolicy::no_delays().with_timeout(20);
            let mut calls_after_expiry = 0;
            let start = Instant::now();
            let _ = wait_until(
                || {
                    if start.elapsed() > Duration::from_millis(20) {
                        calls_after_expiry += 1;
                    }
                    false
                },
                &policy,
            );
            // One final check at most once the deadline has passed
            assert!(calls_after_expiry <= 1);
        }
    }

    mod poll_for_tests {
        use super::*;

        #[test]
        fn test_yields_value() {
            let policy = WaitPolicy::no_delays().with_timeout(100);
            let mut calls = 0;
            let value = poll_for(
                || {
                    calls += 1;
                    (calls >= 2).then_some(42)
                },
                &policy,
            )
            .unwrap();
            assert_eq!(value, 42);
        }

        #[test]
        fn test_timeout_when_never_yields() {
            let policy = WaitPolicy::no_delays().with_timeout(20);
            let result: KinocheckResult<u32> = poll_for(|| None, &policy);
            assert!(result.unwrap_err().is_timeout());
        }
    }

    mod settle_tests {
        use super::*;

        #[test]
        fn test_settle_zero_is_noop() {
            let policy = WaitPolicy::new().with_settle(0);
            let start = Instant::now();
            settle(&policy);
            settle_brief(&policy);
            assert!(start.elapsed() < Duration::from_millis(20));
        }

        #[test]
        fn test_settle_sleeps() {
            let policy = WaitPolicy::new().with_settle(30);
            let start = Instant::now();
            settle(&policy);
            assert!(start.elapsed() >= Duration::from_millis(30));
        }
    }
}
