//! Integration tests for the retry executor.

use super::*;
use crate::context::{Context, ContextDone};
use crate::testing::{RecordingObserver, ScriptedOperation};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing_test::traced_test;

#[tokio::test(start_paused = true)]
async fn test_retry_succeeds_on_third_attempt() {
    let op = ScriptedOperation::failing(2);
    let observer = RecordingObserver::new();
    let start = Instant::now();

    let result = retry(
        || op.call_async(),
        &RetryPolicy::new(3, Duration::ZERO),
        &observer,
    )
    .await;

    assert_eq!(result, Ok(3));
    assert_eq!(op.calls(), 3);
    assert_eq!(observer.len(), 2);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_retry_exhausted_returns_last_error() {
    let op = ScriptedOperation::always_failing();
    let observer = RecordingObserver::new();
    let start = Instant::now();

    let result = retry(
        || op.call_async(),
        &RetryPolicy::new(2, Duration::from_millis(10)),
        &observer,
    )
    .await;

    let exhausted = result.unwrap_err();
    assert_eq!(exhausted.final_error, "failure #2");
    assert_eq!(exhausted.attempts, 2);
    assert_eq!(op.calls(), 2);
    assert_eq!(observer.len(), 2);
    assert_eq!(observer.announced_sleeps(), 1);

    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(10));
    assert!(elapsed < Duration::from_millis(20));
}

#[tokio::test(start_paused = true)]
async fn test_no_trailing_sleep_after_final_attempt() {
    let op = ScriptedOperation::always_failing();
    let start = Instant::now();

    let _ = retry(
        || op.call_async(),
        &RetryPolicy::new(1, Duration::from_secs(3)),
        &NoopObserver,
    )
    .await;

    assert_eq!(op.calls(), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test]
async fn test_success_short_circuits() {
    let op = ScriptedOperation::failing(0);

    let result = retry(
        || op.call_async(),
        &RetryPolicy::new(5, Duration::from_secs(3)),
        &NoopObserver,
    )
    .await;

    assert_eq!(result, Ok(1));
    assert_eq!(op.calls(), 1);
}

#[tokio::test]
async fn test_zero_attempts_still_invokes_once() {
    let op = ScriptedOperation::always_failing();

    let result = retry(
        || op.call_async(),
        &RetryPolicy::new(0, Duration::from_secs(3)),
        &NoopObserver,
    )
    .await;

    assert_eq!(op.calls(), 1);
    assert_eq!(result.unwrap_err().final_error, "failure #1");
}

#[tokio::test(start_paused = true)]
async fn test_failure_reported_before_delay() {
    let delay = Duration::from_millis(100);
    let op = ScriptedOperation::always_failing();
    let observer = RecordingObserver::new();

    let _ = retry(|| op.call_async(), &RetryPolicy::new(3, delay), &observer).await;

    let events = observer.events();
    assert_eq!(observer.attempts(), vec![1, 2, 3]);
    assert_eq!(events[0].next_delay, Some(delay));
    assert_eq!(events[1].next_delay, Some(delay));
    assert_eq!(events[2].next_delay, None);

    // Each report is stamped before its sleep starts.
    assert!(events[0].elapsed < delay);
    assert!(events[1].elapsed >= delay && events[1].elapsed < delay * 2);
    assert!(events[2].elapsed >= delay * 2 && events[2].elapsed < delay * 3);
}

#[tokio::test(start_paused = true)]
async fn test_report_and_sleep_interleave() {
    let delay = Duration::from_millis(50);
    let journal = Arc::new(Mutex::new(Vec::new()));
    let op = ScriptedOperation::always_failing();
    let origin = Instant::now();

    let observer = {
        let journal = journal.clone();
        move |event: &RetryEvent<'_, String>| {
            journal
                .lock()
                .unwrap()
                .push(("report", event.attempt, origin.elapsed()));
        }
    };

    let _ = retry(
        || {
            journal
                .lock()
                .unwrap()
                .push(("call", op.calls() + 1, origin.elapsed()));
            op.call_async()
        },
        &RetryPolicy::new(2, delay),
        &observer,
    )
    .await;

    let journal = journal.lock().unwrap();
    let steps: Vec<_> = journal.iter().map(|(kind, n, _)| (*kind, *n)).collect();
    assert_eq!(
        steps,
        vec![("call", 1), ("report", 1), ("call", 2), ("report", 2)]
    );

    // The delay sits between the first report and the second call.
    let (_, _, first_report) = journal[1];
    let (_, _, second_call) = journal[2];
    assert_eq!(first_report, Duration::ZERO);
    assert!(second_call >= first_report + delay);
}

#[tokio::test]
async fn test_context_passed_to_every_attempt() {
    let ctx = Context::background();
    let seen = Arc::new(Mutex::new(0));
    let op = ScriptedOperation::failing(2);

    let result = retry_with_context(
        &ctx,
        |attempt_ctx: Context| {
            assert!(attempt_ctx.err().is_none());
            *seen.lock().unwrap() += 1;
            op.call_with(attempt_ctx)
        },
        &RetryPolicy::new(3, Duration::ZERO),
        &NoopObserver,
    )
    .await;

    assert_eq!(result, Ok(3));
    assert_eq!(*seen.lock().unwrap(), 3);
}

#[tokio::test]
async fn test_cancelled_context_still_gets_first_attempt() {
    let ctx = Context::background();
    ctx.cancel();
    let op = ScriptedOperation::failing(0);

    let result = retry_with_context(
        &ctx,
        |ctx| op.call_with(ctx),
        &RetryPolicy::new(1, Duration::ZERO),
        &NoopObserver,
    )
    .await;

    assert_eq!(op.calls(), 1);
    assert_eq!(result.unwrap_err().final_error, ContextDone::Cancelled.to_string());
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_does_not_cut_delay_short() {
    let ctx = Context::background();
    let op = ScriptedOperation::always_failing();
    let delay = Duration::from_secs(3);
    let start = Instant::now();

    let canceller = {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            ctx.cancel();
        })
    };

    let result = retry_with_context(
        &ctx,
        |ctx| op.call_with(ctx),
        &RetryPolicy::new(2, delay),
        &NoopObserver,
    )
    .await;
    canceller.await.unwrap();

    assert!(start.elapsed() >= delay);
    assert_eq!(op.calls(), 2);
    assert_eq!(result.unwrap_err().final_error, "context canceled");
}

#[tokio::test]
#[traced_test]
async fn test_tracing_observer_logs_each_failure() {
    let op = ScriptedOperation::failing(2);

    let result = retry(
        || op.call_async(),
        &RetryPolicy::new(3, Duration::ZERO),
        &TracingObserver::new("probe"),
    )
    .await;

    assert!(result.is_ok());
    assert!(logs_contain("got error in attempter"));
    assert!(logs_contain("failure #1"));
    assert!(logs_contain("failure #2"));
    assert!(!logs_contain("failure #3"));
}

#[tokio::test]
async fn test_executor_reuses_policy_and_observer() {
    let executor = RetryExecutor::new(
        RetryPolicy::new(2, Duration::ZERO),
        RecordingObserver::new(),
    );

    let first = ScriptedOperation::always_failing();
    let second = ScriptedOperation::failing(1);

    assert!(executor.run(|| first.call_async()).await.is_err());
    assert_eq!(executor.run(|| second.call_async()).await, Ok(2));
    assert_eq!(executor.observer().len(), 3);
    assert_eq!(executor.policy().attempts(), 2);
}

#[tokio::test]
async fn test_executor_with_context() {
    let executor = RetryExecutor::new(RetryPolicy::new(3, Duration::ZERO), NoopObserver);
    let op = ScriptedOperation::failing(1);

    let result = executor
        .run_with_context(&Context::background(), |ctx| op.call_with(ctx))
        .await;

    assert_eq!(result, Ok(2));
}

#[test]
fn test_executor_blocking() {
    let executor = RetryExecutor::new(RetryPolicy::new(4, Duration::ZERO), NoopObserver);
    let op = ScriptedOperation::failing(3);

    assert_eq!(executor.run_blocking(|| op.call()), Ok(4));
}

#[test]
fn test_default_executor_uses_default_policy() {
    let executor = RetryExecutor::default();
    assert_eq!(*executor.policy(), RetryPolicy::default());
}
