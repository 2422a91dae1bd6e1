//! Thread-blocking variant of the retry loop.
//!
//! For synchronous callers outside an async runtime. The delay is a plain
//! `std::thread::sleep`, so never call this from inside a tokio task.

use std::time::Instant;

use crate::retry::executor::report;
use crate::retry::{RetryExhausted, RetryObserver, RetryPolicy};

/// Run a synchronous operation until it succeeds or the budget is spent.
///
/// Semantics match [`crate::retry()`]: failures are reported before the
/// delay, no delay follows the final attempt, and the last error wins.
///
/// ```rust
/// use mooring::retry::blocking;
/// use mooring::{NoopObserver, RetryPolicy};
/// use std::time::Duration;
///
/// let mut calls = 0;
/// let result = blocking::retry(
///     || {
///         calls += 1;
///         if calls < 2 { Err("refused") } else { Ok("pong") }
///     },
///     &RetryPolicy::new(3, Duration::from_millis(1)),
///     &NoopObserver,
/// );
///
/// assert_eq!(result, Ok("pong"));
/// assert_eq!(calls, 2);
/// ```
pub fn retry<T, E, F, O>(
    mut operation: F,
    policy: &RetryPolicy,
    observer: &O,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Result<T, E>,
    O: RetryObserver<E> + ?Sized,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match operation() {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match report(policy, observer, attempt, &error, start.elapsed()) {
            Some(delay) if !delay.is_zero() => std::thread::sleep(delay),
            Some(_) => {}
            None => return Err(RetryExhausted::new(error, attempt, start.elapsed())),
        }
    }
}
