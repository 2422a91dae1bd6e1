//! Error types for retry operations.

use std::time::Duration;

/// Error returned when every attempt allowed by a policy has failed.
///
/// Only the error of the final attempt is retained. Earlier failures are
/// observable through the [`RetryObserver`](super::RetryObserver) only.
///
/// # Examples
///
/// ```rust
/// use mooring::{retry, NoopObserver, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::new(2, Duration::from_millis(1));
/// let mut calls = 0;
///
/// let result = retry(
///     || {
///         calls += 1;
///         let call = calls;
///         async move { Err::<(), _>(format!("failure #{call}")) }
///     },
///     &policy,
///     &NoopObserver,
/// )
/// .await;
///
/// let exhausted = result.unwrap_err();
/// assert_eq!(exhausted.attempts, 2);
/// assert_eq!(exhausted.final_error, "failure #2");
/// # });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryExhausted<E> {
    /// The error from the final attempt.
    pub final_error: E,
    /// Total number of invocations performed.
    pub attempts: u32,
    /// Wall-clock time from the first invocation to the final failure.
    pub total_duration: Duration,
}

impl<E> RetryExhausted<E> {
    /// Create a new RetryExhausted error.
    pub fn new(final_error: E, attempts: u32, total_duration: Duration) -> Self {
        Self {
            final_error,
            attempts,
            total_duration,
        }
    }

    /// Extract the final error, discarding metadata.
    pub fn into_error(self) -> E {
        self.final_error
    }

    /// Get a reference to the final error.
    pub fn error(&self) -> &E {
        &self.final_error
    }

    /// Transform the final error, keeping the retry metadata.
    pub fn map_err<F, E2>(self, f: F) -> RetryExhausted<E2>
    where
        F: FnOnce(E) -> E2,
    {
        RetryExhausted {
            final_error: f(self.final_error),
            attempts: self.attempts,
            total_duration: self.total_duration,
        }
    }
}

impl<E: std::fmt::Display> std::fmt::Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "retry exhausted after {} attempts ({:?}): {}",
            self.attempts, self.total_duration, self.final_error
        )
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryExhausted<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.final_error)
    }
}
