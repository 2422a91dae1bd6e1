//! Bounded fixed-delay retry.
//!
//! The executor runs a fallible operation up to N times with a constant
//! delay between attempts:
//!
//! - **Policy is data**: [`RetryPolicy`] is an immutable `{attempts, delay}`
//!   value, trivially cloned and compared
//! - **Observer is injected**: every failed attempt is reported to a
//!   [`RetryObserver`] passed by the caller; nothing goes through a global
//!   logger
//! - **Last error wins**: exhaustion returns [`RetryExhausted`] holding the
//!   error of the final attempt only
//!
//! Delays are constant. Every error is retried the same way.
//!
//! # Quick Start
//!
//! ```rust
//! use mooring::{retry, RetryPolicy, TracingObserver};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let policy = RetryPolicy::new(3, Duration::from_millis(10));
//!
//! let result = retry(
//!     || async { Ok::<_, String>("connected") },
//!     &policy,
//!     &TracingObserver::new("database"),
//! )
//! .await;
//!
//! assert_eq!(result.unwrap(), "connected");
//! # });
//! ```
//!
//! # Timing
//!
//! For `attempts = N` the loop performs at most N invocations and N - 1
//! sleeps. The failure report for attempt `i` always happens before the
//! sleep that precedes attempt `i + 1`.

pub mod blocking;
mod error;
mod executor;
mod observer;
mod policy;

pub use error::RetryExhausted;
pub use executor::{retry, retry_with_context, RetryExecutor};
pub use observer::{NoopObserver, RetryEvent, RetryObserver, TracingObserver};
pub use policy::{RetryPolicy, DEFAULT_ATTEMPTS, DEFAULT_DELAY};

#[cfg(test)]
mod tests;
