//! Testing utilities for code built on mooring
//!
//! Helpers for exercising retry loops and managed resources without a real
//! backend:
//!
//! - [`ScriptedOperation`]: fails a fixed number of times, then succeeds
//! - [`RecordingObserver`]: keeps every failure report for later assertions
//! - [`MockResource`]: a [`Resource`] scripted through its configuration string
//!
//! # Examples
//!
//! ```rust
//! use mooring::testing::{RecordingObserver, ScriptedOperation};
//! use mooring::{retry, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let op = ScriptedOperation::failing(2);
//! let observer = RecordingObserver::new();
//!
//! let result = retry(|| op.call_async(), &RetryPolicy::new(5, Duration::ZERO), &observer).await;
//!
//! assert!(result.is_ok());
//! assert_eq!(op.calls(), 3);
//! assert_eq!(observer.attempts(), vec![1, 2]);
//! # });
//! ```

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::context::Context;
use crate::resource::Resource;
use crate::retry::{RetryEvent, RetryObserver};

/// An operation that fails its first `failures` calls and succeeds after.
///
/// Clones share the same call counter.
#[derive(Debug, Clone)]
pub struct ScriptedOperation {
    failures: u32,
    calls: Arc<AtomicU32>,
}

impl ScriptedOperation {
    /// Fail the first `failures` calls, then succeed.
    pub fn failing(failures: u32) -> Self {
        ScriptedOperation {
            failures,
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Never succeed.
    pub fn always_failing() -> Self {
        Self::failing(u32::MAX)
    }

    /// Invoke the operation. The error names the call number.
    pub fn call(&self) -> Result<u32, String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= self.failures {
            Err(format!("failure #{n}"))
        } else {
            Ok(n)
        }
    }

    /// Async form of [`call`](Self::call).
    pub fn call_async(&self) -> impl Future<Output = Result<u32, String>> + Send + 'static {
        let result = self.call();
        async move { result }
    }

    /// Context-aware form: fails with the context's reason if it is finished.
    pub fn call_with(&self, ctx: Context) -> impl Future<Output = Result<u32, String>> + Send {
        let this = self.clone();
        async move {
            match ctx.err() {
                Some(done) => {
                    this.calls.fetch_add(1, Ordering::SeqCst);
                    Err(done.to_string())
                }
                None => this.call(),
            }
        }
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

/// One failure report captured by a [`RecordingObserver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedFailure {
    /// Attempt index (1-based).
    pub attempt: u32,
    /// The error, rendered with `Display`.
    pub error: String,
    /// Delay announced before the next attempt.
    pub next_delay: Option<Duration>,
    /// Elapsed time reported with the event.
    pub elapsed: Duration,
}

/// Observer that stores every failure report.
///
/// Clones share the same log, so keep one clone for assertions and hand the
/// other to the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<RecordedFailure>>>,
}

impl RecordingObserver {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded failures, oldest first.
    pub fn events(&self) -> Vec<RecordedFailure> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded failures.
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attempt indices of the recorded failures.
    pub fn attempts(&self) -> Vec<u32> {
        self.events().into_iter().map(|e| e.attempt).collect()
    }

    /// Rendered errors of the recorded failures.
    pub fn errors(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.error).collect()
    }

    /// Number of reports that announced a following delay.
    pub fn announced_sleeps(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| e.next_delay.is_some())
            .count()
    }
}

impl<E: fmt::Display + ?Sized> RetryObserver<E> for RecordingObserver {
    fn on_failure(&self, event: &RetryEvent<'_, E>) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedFailure {
                attempt: event.attempt,
                error: event.error.to_string(),
                next_delay: event.next_delay,
                elapsed: event.elapsed,
            });
    }
}

/// Error type of [`MockResource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockError(pub String);

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for MockError {}

/// Parsed `mock://` configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockConfig {
    /// Host part of the URI.
    pub host: String,
    /// Number of probes that fail before one succeeds.
    pub fail: u32,
    /// Make `release` report an error.
    pub release_error: bool,
    /// Make `construct` fail.
    pub construct_error: bool,
}

/// A [`Resource`] scripted through its configuration string.
///
/// `mock://<host>?fail=N&release_error=1&construct_error=1`
///
/// - `fail=N`: the first N probes fail with `connection refused (probe i)`
/// - `release_error=1`: release reports an error
/// - `construct_error=1`: construction fails
///
/// Any other scheme is a configuration error. Probes fail with the
/// context's reason if the context is already finished.
#[derive(Debug)]
pub struct MockResource {
    config: MockConfig,
    probes: AtomicU32,
    releases: AtomicU32,
}

impl MockResource {
    /// The configuration it was built from.
    pub fn config(&self) -> &MockConfig {
        &self.config
    }

    /// Number of probes so far.
    pub fn probe_count(&self) -> u32 {
        self.probes.load(Ordering::SeqCst)
    }

    /// Number of releases so far.
    pub fn release_count(&self) -> u32 {
        self.releases.load(Ordering::SeqCst)
    }
}

impl Resource for MockResource {
    const NAME: &'static str = "mock";

    type Config = MockConfig;
    type Error = MockError;

    fn parse_config(raw: &str) -> Result<MockConfig, MockError> {
        let rest = raw
            .strip_prefix("mock://")
            .ok_or_else(|| MockError(format!("unsupported scheme in {raw:?}")))?;
        let (host, query) = rest.split_once('?').unwrap_or((rest, ""));
        if host.is_empty() {
            return Err(MockError("missing host".to_string()));
        }

        let mut config = MockConfig {
            host: host.to_string(),
            ..MockConfig::default()
        };
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match key {
                "fail" => {
                    config.fail = value
                        .parse()
                        .map_err(|_| MockError(format!("invalid fail count {value:?}")))?
                }
                "release_error" => config.release_error = value == "1",
                "construct_error" => config.construct_error = value == "1",
                other => return Err(MockError(format!("unknown option {other:?}"))),
            }
        }
        Ok(config)
    }

    fn construct(config: MockConfig) -> Result<Self, MockError> {
        if config.construct_error {
            return Err(MockError(format!("cannot allocate pool for {}", config.host)));
        }
        Ok(MockResource {
            config,
            probes: AtomicU32::new(0),
            releases: AtomicU32::new(0),
        })
    }

    async fn probe(&self, ctx: &Context) -> Result<(), MockError> {
        let n = self.probes.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(done) = ctx.err() {
            return Err(MockError(done.to_string()));
        }
        if n <= self.config.fail {
            Err(MockError(format!("connection refused (probe {n})")))
        } else {
            Ok(())
        }
    }

    async fn release(&self, _ctx: &Context) -> Result<(), MockError> {
        self.releases.fetch_add(1, Ordering::SeqCst);
        if self.config.release_error {
            Err(MockError("close: broken pipe".to_string()))
        } else {
            Ok(())
        }
    }
}

/// Proptest strategies for mooring types.
#[cfg(feature = "proptest")]
pub mod strategies {
    use crate::retry::RetryPolicy;
    use proptest::prelude::*;
    use std::time::Duration;

    /// Policies with 0..=max_attempts attempts and a millisecond delay below 1s.
    pub fn retry_policy(max_attempts: u32) -> impl Strategy<Value = RetryPolicy> {
        (0..=max_attempts, 0u64..1000)
            .prop_map(|(attempts, ms)| RetryPolicy::new(attempts, Duration::from_millis(ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_operation_fails_then_succeeds() {
        let op = ScriptedOperation::failing(2);
        assert_eq!(op.call(), Err("failure #1".to_string()));
        assert_eq!(op.call(), Err("failure #2".to_string()));
        assert_eq!(op.call(), Ok(3));
        assert_eq!(op.calls(), 3);
    }

    #[tokio::test]
    async fn test_scripted_operation_sees_cancelled_context() {
        let op = ScriptedOperation::failing(0);
        let ctx = Context::background();
        ctx.cancel();

        assert_eq!(op.call_with(ctx).await, Err("context canceled".to_string()));
        assert_eq!(op.calls(), 1);
    }

    #[test]
    fn test_recording_observer_shares_log_between_clones() {
        let observer = RecordingObserver::new();
        let handle = observer.clone();

        RetryObserver::<str>::on_failure(
            &handle,
            &RetryEvent {
                attempt: 1,
                error: "refused",
                next_delay: Some(Duration::from_secs(3)),
                elapsed: Duration::ZERO,
            },
        );

        assert_eq!(observer.len(), 1);
        assert_eq!(observer.errors(), vec!["refused".to_string()]);
        assert_eq!(observer.announced_sleeps(), 1);
    }

    #[test]
    fn test_mock_config_parsing() {
        let config = MockResource::parse_config("mock://db?fail=3&release_error=1").unwrap();
        assert_eq!(
            config,
            MockConfig {
                host: "db".to_string(),
                fail: 3,
                release_error: true,
                construct_error: false,
            }
        );
    }

    #[test]
    fn test_mock_config_rejects_garbage() {
        assert!(MockResource::parse_config("postgres://db").is_err());
        assert!(MockResource::parse_config("mock://").is_err());
        assert!(MockResource::parse_config("mock://db?fail=lots").is_err());
        assert!(MockResource::parse_config("mock://db?color=blue").is_err());
    }

    #[tokio::test]
    async fn test_mock_probe_script() {
        let config = MockResource::parse_config("mock://db?fail=1").unwrap();
        let mock = MockResource::construct(config).unwrap();
        let ctx = Context::background();

        assert_eq!(
            mock.probe(&ctx).await,
            Err(MockError("connection refused (probe 1)".to_string()))
        );
        assert_eq!(mock.probe(&ctx).await, Ok(()));
        assert_eq!(mock.probe_count(), 2);
    }
}
