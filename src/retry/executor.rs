//! The bounded fixed-delay retry loop.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::context::Context;
use crate::retry::{RetryEvent, RetryExhausted, RetryObserver, RetryPolicy};

/// Run an operation until it succeeds or the policy's budget is spent.
///
/// The operation is invoked up to `policy.max_invocations()` times. Each
/// failure is reported to `observer` before the executor sleeps for
/// `policy.delay()`; no sleep follows the final attempt. On exhaustion the
/// error from the last attempt is returned.
///
/// Sleeping uses `tokio::time::sleep`, so only the calling task is
/// suspended.
///
/// # Example
///
/// ```rust
/// use mooring::{retry, NoopObserver, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let mut calls = 0;
/// let result = retry(
///     || {
///         calls += 1;
///         let n = calls;
///         async move { if n == 3 { Ok(n) } else { Err("not yet") } }
///     },
///     &RetryPolicy::new(5, Duration::ZERO),
///     &NoopObserver,
/// )
/// .await;
///
/// assert_eq!(result, Ok(3));
/// # });
/// ```
pub async fn retry<T, E, F, Fut, O>(
    mut operation: F,
    policy: &RetryPolicy,
    observer: &O,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    O: RetryObserver<E> + ?Sized,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        match report(policy, observer, attempt, &error, start.elapsed()) {
            Some(delay) => pause(delay).await,
            None => return Err(RetryExhausted::new(error, attempt, start.elapsed())),
        }
    }
}

/// Run a context-aware operation until it succeeds or the budget is spent.
///
/// Same semantics as [`retry`], except that `operation` receives a clone of
/// `ctx` on every attempt. The executor never inspects `ctx` itself: an
/// already cancelled context still gets its first attempt, and cancelling
/// during the inter-attempt delay does not cut the delay short. It is up to
/// the operation to honour the context, typically through
/// [`Context::run`].
///
/// # Example
///
/// ```rust
/// use mooring::{retry_with_context, Context, NoopObserver, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let ctx = Context::background();
/// let result = retry_with_context(
///     &ctx,
///     |ctx: Context| async move { ctx.run(async { 42 }).await },
///     &RetryPolicy::new(3, Duration::ZERO),
///     &NoopObserver,
/// )
/// .await;
///
/// assert_eq!(result, Ok(42));
/// # });
/// ```
pub async fn retry_with_context<T, E, F, Fut, O>(
    ctx: &Context,
    mut operation: F,
    policy: &RetryPolicy,
    observer: &O,
) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(Context) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    O: RetryObserver<E> + ?Sized,
{
    retry(|| operation(ctx.clone()), policy, observer).await
}

/// Report a failed attempt and decide whether another one follows.
pub(crate) fn report<E, O>(
    policy: &RetryPolicy,
    observer: &O,
    attempt: u32,
    error: &E,
    elapsed: Duration,
) -> Option<Duration>
where
    O: RetryObserver<E> + ?Sized,
{
    let next_delay = policy.delay_after(attempt);
    observer.on_failure(&RetryEvent {
        attempt,
        error,
        next_delay,
        elapsed,
    });
    next_delay
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

/// A retry policy bundled with the observer that receives its failures.
///
/// This is the reusable form of [`retry`] / [`retry_with_context`]: build it
/// once, run many operations through it.
///
/// ```rust
/// use mooring::{RetryExecutor, RetryPolicy, TracingObserver};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let executor = RetryExecutor::new(
///     RetryPolicy::new(2, Duration::from_millis(1)),
///     TracingObserver::new("cache"),
/// );
///
/// let result = executor.run(|| async { Err::<(), _>("unreachable") }).await;
/// assert_eq!(result.unwrap_err().attempts, 2);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct RetryExecutor<O> {
    policy: RetryPolicy,
    observer: O,
}

impl<O> RetryExecutor<O> {
    /// Create an executor from a policy and an observer.
    pub fn new(policy: RetryPolicy, observer: O) -> Self {
        Self { policy, observer }
    }

    /// The policy this executor applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The observer receiving failure reports.
    pub fn observer(&self) -> &O {
        &self.observer
    }

    /// Run `operation` under this executor's policy.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: RetryObserver<E>,
    {
        retry(operation, &self.policy, &self.observer).await
    }

    /// Run a context-aware `operation` under this executor's policy.
    pub async fn run_with_context<T, E, F, Fut>(
        &self,
        ctx: &Context,
        operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(Context) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        O: RetryObserver<E>,
    {
        retry_with_context(ctx, operation, &self.policy, &self.observer).await
    }

    /// Blocking counterpart of [`run`](Self::run).
    pub fn run_blocking<T, E, F>(&self, operation: F) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut() -> Result<T, E>,
        O: RetryObserver<E>,
    {
        crate::retry::blocking::retry(operation, &self.policy, &self.observer)
    }
}

impl Default for RetryExecutor<crate::retry::TracingObserver> {
    fn default() -> Self {
        Self::new(RetryPolicy::default(), crate::retry::TracingObserver::default())
    }
}
