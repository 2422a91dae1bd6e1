//! Retry Patterns Example
//!
//! Demonstrates the bounded fixed-delay retry executor on its own:
//! - Plain async retry with a tracing observer
//! - A closure observer for custom reporting
//! - Context-aware retry where the operation honours a deadline
//! - A reusable executor and the blocking variant
//!
//! Run with: cargo run --example retry_patterns

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use mooring::retry::blocking;
use mooring::{
    retry, retry_with_context, Context, NoopObserver, RetryEvent, RetryExecutor, RetryPolicy,
    TracingObserver,
};

// ==================== Basic Retry ====================

/// Example 1: an operation that fails twice, observed through tracing
async fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let attempts = Arc::new(AtomicU32::new(0));
    let result = retry(
        || {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                println!("  Attempt {}", n);
                if n < 3 {
                    Err(format!("transient failure #{}", n))
                } else {
                    Ok("connected")
                }
            }
        },
        &RetryPolicy::new(5, Duration::from_millis(100)),
        &TracingObserver::new("connect"),
    )
    .await;

    match result {
        Ok(value) => println!("Success after {} attempts: {}", attempts.load(Ordering::SeqCst), value),
        Err(exhausted) => println!("Failed: {}", exhausted),
    }
}

// ==================== Custom Observer ====================

/// Example 2: any `Fn(&RetryEvent)` is an observer
async fn example_closure_observer() {
    println!("\n=== Example 2: Closure Observer ===");

    let observer = |event: &RetryEvent<'_, &str>| match event.next_delay {
        Some(delay) => println!(
            "  attempt {} failed ({}), retrying in {:?}",
            event.attempt, event.error, delay
        ),
        None => println!("  attempt {} failed ({}), giving up", event.attempt, event.error),
    };

    let result: Result<(), _> = retry(
        || async { Err("service unavailable") },
        &RetryPolicy::new(3, Duration::from_millis(50)),
        &observer,
    )
    .await;

    if let Err(exhausted) = result {
        println!(
            "Gave up after {} attempts in {:?}: {}",
            exhausted.attempts, exhausted.total_duration, exhausted.final_error
        );
    }
}

// ==================== Context ====================

/// Example 3: the operation honours a deadline; the executor does not
async fn example_context() {
    println!("\n=== Example 3: Context-Aware Retry ===");

    let ctx = Context::background().with_timeout(Duration::from_millis(250));
    let result = retry_with_context(
        &ctx,
        |ctx: Context| async move {
            match ctx.run(tokio::time::sleep(Duration::from_millis(80))).await {
                Ok(()) => Err("slow backend".to_string()),
                Err(done) => Err(done.to_string()),
            }
        },
        &RetryPolicy::new(4, Duration::from_millis(50)),
        &TracingObserver::new("query"),
    )
    .await;

    match result {
        Ok(()) => println!("Unexpected success"),
        Err(exhausted) => println!("Final error: {}", exhausted.final_error),
    }
}

// ==================== Executor ====================

/// Example 4: one policy and observer shared by several calls
async fn example_executor() {
    println!("\n=== Example 4: Reusable Executor ===");

    let executor = RetryExecutor::new(RetryPolicy::new(2, Duration::from_millis(10)), NoopObserver);

    for name in ["users", "orders"] {
        let result = executor.run(|| async move { Ok::<_, String>(name.len()) }).await;
        println!("  {} -> {:?}", name, result);
    }

    let calls = AtomicU32::new(0);
    let result = blocking::retry(
        || {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err("disk busy")
            } else {
                Ok("flushed")
            }
        },
        &RetryPolicy::new(3, Duration::from_millis(10)),
        &TracingObserver::new("flush"),
    );
    println!("  blocking flush -> {:?}", result);
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("======================================");
    println!("       Retry Patterns Example         ");
    println!("======================================");

    example_basic_retry().await;
    example_closure_observer().await;
    example_context().await;
    example_executor().await;

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
