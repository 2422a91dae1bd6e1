//! Cancellation and deadline propagation
//!
//! A [`Context`] is handed to every lifecycle hook and to every attempt of a
//! contextual retry. It carries two signals:
//!
//! - an explicit cancellation, backed by a [`CancellationToken`]
//! - an optional deadline, measured on the tokio clock
//!
//! Children derived with [`Context::with_timeout`] or [`Context::child`] are
//! cancelled whenever their parent is, and never outlive the parent's
//! deadline.
//!
//! # Examples
//!
//! ```
//! use mooring::{Context, ContextDone};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let ctx = Context::background().with_timeout(Duration::from_secs(5));
//! assert!(ctx.err().is_none());
//!
//! ctx.cancel();
//! assert_eq!(ctx.err(), Some(ContextDone::Cancelled));
//!
//! // Work raced against a finished context never completes
//! let result = ctx.run(async { 42 }).await;
//! assert_eq!(result, Err(ContextDone::Cancelled));
//! # });
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a [`Context`] is finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextDone {
    /// The context, or one of its ancestors, was cancelled.
    Cancelled,
    /// The context's deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for ContextDone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextDone::Cancelled => write!(f, "context canceled"),
            ContextDone::DeadlineExceeded => write!(f, "context deadline exceeded"),
        }
    }
}

impl StdError for ContextDone {}

/// A cancellable context with an optional deadline.
///
/// Cloning is cheap and clones share the same cancellation state.
#[derive(Debug, Clone)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Context {
            token: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Derive a child that is cancelled together with `self`.
    ///
    /// Cancelling the child does not affect the parent.
    pub fn child(&self) -> Self {
        Context {
            token: self.token.child_token(),
            deadline: self.deadline,
        }
    }

    /// Derive a child whose deadline is at most `timeout` from now.
    ///
    /// A timeout too large to represent as an instant adds no deadline of
    /// its own, so `Duration::MAX` means "no timeout".
    ///
    /// # Examples
    ///
    /// ```
    /// use mooring::Context;
    /// use std::time::Duration;
    ///
    /// # tokio_test::block_on(async {
    /// let outer = Context::background().with_timeout(Duration::from_secs(1));
    /// let inner = outer.with_timeout(Duration::from_secs(60));
    ///
    /// // The tighter parent deadline wins
    /// assert_eq!(inner.deadline(), outer.deadline());
    /// # });
    /// ```
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(),
        }
    }

    /// Derive a child with the given deadline, or the parent's if earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(parent) => parent.min(deadline),
            None => deadline,
        };
        Context {
            token: self.token.child_token(),
            deadline: Some(deadline),
        }
    }

    /// Cancel this context and every context derived from it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns true if this context has been cancelled.
    ///
    /// This does not consider the deadline; see [`err`](Self::err).
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The deadline, if one is set.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, `None` when there is no deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Why this context is finished, or `None` while it is still live.
    ///
    /// Cancellation is reported in preference to an expired deadline.
    pub fn err(&self) -> Option<ContextDone> {
        if self.token.is_cancelled() {
            Some(ContextDone::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(ContextDone::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextDone {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => ContextDone::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => ContextDone::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                ContextDone::Cancelled
            }
        }
    }

    /// Run `future` unless the context finishes first.
    ///
    /// A context that is already finished does not poll `future` at all.
    pub async fn run<F>(&self, future: F) -> Result<F::Output, ContextDone>
    where
        F: Future,
    {
        if let Some(done) = self.err() {
            return Err(done);
        }
        tokio::select! {
            biased;
            done = self.done() => Err(done),
            output = future => Ok(output),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}
