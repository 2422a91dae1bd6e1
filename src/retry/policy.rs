//! Retry policy types and configuration.

use std::time::Duration;

/// Default number of attempts for resource activation.
pub const DEFAULT_ATTEMPTS: u32 = 5;

/// Default delay between activation attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

/// A bounded, fixed-delay retry policy.
///
/// Policies are pure data: they describe how many times an operation may
/// run and how long to wait between runs, but they never execute anything.
///
/// # Attempt floor
///
/// A policy with `attempts == 0` is accepted and behaves exactly like
/// `attempts == 1`: the operation runs once and its error is returned.
///
/// # Examples
///
/// ```rust
/// use mooring::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(250));
///
/// assert_eq!(policy.attempts(), 3);
/// assert_eq!(policy.delay_after(1), Some(Duration::from_millis(250)));
/// assert_eq!(policy.delay_after(2), Some(Duration::from_millis(250)));
/// assert_eq!(policy.delay_after(3), None); // no trailing delay
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryPolicy {
    attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with an explicit attempt budget and inter-attempt delay.
    pub const fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// A policy that runs the operation exactly once.
    ///
    /// ```rust
    /// use mooring::RetryPolicy;
    ///
    /// assert_eq!(RetryPolicy::once().max_invocations(), 1);
    /// ```
    pub const fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Replace the attempt budget.
    pub const fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    /// Replace the inter-attempt delay.
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// The configured attempt budget, as given.
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// The fixed delay inserted between attempts.
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of invocations the executor will perform in the worst case.
    ///
    /// This is `attempts` with a floor of one.
    ///
    /// ```rust
    /// use mooring::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_invocations(), 1);
    /// assert_eq!(RetryPolicy::new(4, Duration::ZERO).max_invocations(), 4);
    /// ```
    pub const fn max_invocations(&self) -> u32 {
        if self.attempts == 0 {
            1
        } else {
            self.attempts
        }
    }

    /// Delay to wait after the given failed attempt (1-indexed).
    ///
    /// Returns `None` once the budget is spent, which is how the executor
    /// knows not to sleep after the final attempt.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        if attempt >= self.max_invocations() {
            None
        } else {
            Some(self.delay)
        }
    }

    /// Upper bound on time spent sleeping across a fully failing run.
    ///
    /// ```rust
    /// use mooring::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.total_delay(), Duration::from_secs(12));
    /// ```
    pub fn total_delay(&self) -> Duration {
        self.delay.saturating_mul(self.max_invocations() - 1)
    }
}

impl Default for RetryPolicy {
    /// Five attempts, three seconds apart.
    fn default() -> Self {
        Self::new(DEFAULT_ATTEMPTS, DEFAULT_DELAY)
    }
}
