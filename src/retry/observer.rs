//! Observation of failed attempts.

use std::fmt;
use std::time::Duration;

/// Information about a failed attempt, passed to a [`RetryObserver`].
#[derive(Debug, Clone)]
pub struct RetryEvent<'a, E: ?Sized> {
    /// Which attempt just failed (1-indexed).
    pub attempt: u32,
    /// The error from the failed attempt.
    pub error: &'a E,
    /// Delay before the next attempt, or `None` if this was the final one.
    pub next_delay: Option<Duration>,
    /// Total elapsed time since the first attempt started.
    pub elapsed: Duration,
}

impl<E: ?Sized> RetryEvent<'_, E> {
    /// Returns true if no further attempt follows this one.
    pub fn is_final(&self) -> bool {
        self.next_delay.is_none()
    }
}

/// Receives one observation per failed attempt.
///
/// The executor calls [`on_failure`](RetryObserver::on_failure) for every
/// failed attempt, including the one that exhausts the budget, and always
/// before sleeping. Implementations should not block.
///
/// Any `Fn(&RetryEvent<'_, E>)` closure is an observer:
///
/// ```rust
/// use mooring::{RetryEvent, RetryObserver};
///
/// let observer = |event: &RetryEvent<'_, String>| {
///     println!("attempt {} failed: {}", event.attempt, event.error);
/// };
///
/// observer.on_failure(&RetryEvent {
///     attempt: 1,
///     error: &"boom".to_string(),
///     next_delay: None,
///     elapsed: std::time::Duration::ZERO,
/// });
/// ```
pub trait RetryObserver<E: ?Sized> {
    /// Record a failed attempt.
    fn on_failure(&self, event: &RetryEvent<'_, E>);
}

impl<E: ?Sized, F> RetryObserver<E> for F
where
    F: Fn(&RetryEvent<'_, E>),
{
    fn on_failure(&self, event: &RetryEvent<'_, E>) {
        self(event)
    }
}

/// Observer that emits a `tracing` warning for each failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingObserver {
    operation: &'static str,
}

impl TracingObserver {
    /// Create an observer tagging its events with the given operation name.
    pub const fn new(operation: &'static str) -> Self {
        Self { operation }
    }

    /// The operation name attached to every event.
    pub const fn operation(&self) -> &'static str {
        self.operation
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new("retry")
    }
}

impl<E: fmt::Display + ?Sized> RetryObserver<E> for TracingObserver {
    fn on_failure(&self, event: &RetryEvent<'_, E>) {
        tracing::warn!(
            operation = self.operation,
            attempts = event.attempt,
            error = %event.error,
            next_delay = ?event.next_delay,
            "got error in attempter"
        );
    }
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoopObserver;

impl<E: ?Sized> RetryObserver<E> for NoopObserver {
    fn on_failure(&self, _event: &RetryEvent<'_, E>) {}
}
