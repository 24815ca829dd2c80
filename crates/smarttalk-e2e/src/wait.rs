//! Condition polling.
//!
//! Scenarios never sleep for a fixed time to "let the page settle"; they poll
//! a check until it yields a value or a bounded timeout elapses.

use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Implicit wait for locate/assert actions (4 seconds)
pub const DEFAULT_IMPLICIT_WAIT_MS: u64 = 4_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Timeout for settle waits that replace fixed pauses (10 seconds)
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 10_000;

/// Navigation timeout (60 seconds)
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 60_000;

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_IMPLICIT_WAIT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Timeout as duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as duration (never zero)
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

// =============================================================================
// WAITER
// =============================================================================

/// Poll loop driver
#[derive(Debug, Clone, Copy, Default)]
pub struct Waiter {
    options: WaitOptions,
}

impl Waiter {
    /// Create a waiter with default options
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom options
    #[must_use]
    pub const fn with_options(options: WaitOptions) -> Self {
        Self { options }
    }

    /// Current options
    #[must_use]
    pub const fn options(&self) -> &WaitOptions {
        &self.options
    }

    /// Start a poll clock for a hand-written poll loop
    #[must_use]
    pub fn start(&self) -> PollClock {
        let start = Instant::now();
        PollClock {
            start,
            deadline: start + self.options.timeout(),
            interval: self.options.poll_interval(),
            attempts: 0,
        }
    }
}

/// Deadline bookkeeping for one poll loop.
///
/// The check is evaluated at least once, and once more at the deadline, so
/// a zero timeout still checks the current state:
///
/// ```text
/// loop { clock.record_attempt(); check; if done { break } if !clock.tick().await { timeout } }
/// ```
#[derive(Debug, Clone)]
pub struct PollClock {
    start: Instant,
    deadline: Instant,
    interval: Duration,
    attempts: u32,
}

impl PollClock {
    /// Count one check
    pub fn record_attempt(&mut self) {
        self.attempts += 1;
    }

    /// Sleep until the next poll; `false` once the deadline has passed
    pub async fn tick(&mut self) -> bool {
        let now = Instant::now();
        if now >= self.deadline {
            return false;
        }
        tokio::time::sleep(self.interval.min(self.deadline - now)).await;
        true
    }

    /// Time since the clock started
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Checks so far
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    mod options_tests {
        use super::*;

        #[test]
        fn test_defaults() {
            let opts = WaitOptions::default();
            assert_eq!(opts.timeout_ms, 4_000);
            assert_eq!(opts.poll_interval_ms, 50);
        }

        #[test]
        fn test_builder() {
            let opts = WaitOptions::new().with_timeout(10).with_poll_interval(0);
            assert_eq!(opts.timeout(), Duration::from_millis(10));
            assert_eq!(opts.poll_interval(), Duration::from_millis(1));
        }
    }

    mod clock_tests {
        use super::*;

        async fn poll_until_ready(clock: &mut PollClock, ready_on: u32) -> bool {
            loop {
                clock.record_attempt();
                if clock.attempts() >= ready_on {
                    return true;
                }
                if !clock.tick().await {
                    return false;
                }
            }
        }

        #[tokio::test]
        async fn test_ready_after_several_polls() {
            let waiter = Waiter::with_options(WaitOptions::new().with_timeout(2_000).with_poll_interval(1));
            let mut clock = waiter.start();
            assert!(poll_until_ready(&mut clock, 3).await);
            assert_eq!(clock.attempts(), 3);
        }

        #[tokio::test]
        async fn test_times_out_at_deadline() {
            let waiter = Waiter::with_options(WaitOptions::new().with_timeout(20).with_poll_interval(5));
            let mut clock = waiter.start();
            assert!(!poll_until_ready(&mut clock, u32::MAX).await);
            assert!(clock.attempts() >= 2);
            assert!(clock.elapsed() >= Duration::from_millis(20));
        }

        #[tokio::test]
        async fn test_zero_timeout_checks_once() {
            let mut clock = Waiter::with_options(WaitOptions::new().with_timeout(0)).start();
            assert!(!poll_until_ready(&mut clock, u32::MAX).await);
            assert_eq!(clock.attempts(), 1);
        }

        #[test]
        fn test_waiter_keeps_options() {
            let opts = WaitOptions::new().with_timeout(123);
            assert_eq!(Waiter::with_options(opts).options().timeout_ms, 123);
            assert_eq!(Waiter::new().options().timeout_ms, DEFAULT_IMPLICIT_WAIT_MS);
        }
    }
}
