//! # Mooring
//!
//! > *"Nothing leaves the harbour until every line is fast."*
//!
//! Lifecycle-gated resource initialization with a bounded, fixed-delay retry
//! executor.
//!
//! ## Philosophy
//!
//! A service should not report itself started while its backends are
//! unreachable, and it should not hang forever waiting for them either:
//! - **Construct** handles eagerly and fail fast on bad configuration
//! - **Activate** them at startup by probing with a bounded retry budget
//! - **Release** them at shutdown, logging rather than propagating errors
//!
//! ## Quick Example
//!
//! ```rust
//! use mooring::testing::MockResource;
//! use mooring::{App, Context, ManagedResource, RetryPolicy};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let mut app = App::new();
//!
//! // The first two probes fail; the third one gets through.
//! let pool = ManagedResource::<MockResource>::open("mock://primary?fail=2")
//!     .unwrap()
//!     .with_policy(RetryPolicy::new(5, Duration::from_millis(5)))
//!     .register(&mut app)
//!     .handle();
//!
//! app.start(&Context::background()).await.unwrap();
//! assert_eq!(pool.probe_count(), 3);
//!
//! app.stop(&Context::background()).await.unwrap();
//! assert_eq!(pool.release_count(), 1);
//! # });
//! ```
//!
//! The retry executor is usable on its own:
//!
//! ```rust
//! use mooring::testing::ScriptedOperation;
//! use mooring::{retry, RetryPolicy, TracingObserver};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let op = ScriptedOperation::failing(1);
//! let result = retry(
//!     || op.call_async(),
//!     &RetryPolicy::new(3, Duration::ZERO),
//!     &TracingObserver::new("fetch"),
//! )
//! .await;
//!
//! assert_eq!(result.unwrap(), 2);
//! # });
//! ```
//!
//! For runnable programs, see the `demos/` directory.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod context;
pub mod lifecycle;
pub mod resource;
pub mod retry;
pub mod testing;

// Re-exports
pub use context::{Context, ContextDone};
pub use lifecycle::{
    wait_for_shutdown_signal, App, AppState, BoxError, Hook, HookFailure, Lifecycle,
    LifecycleConfig, LifecycleError,
};
pub use resource::{ManagedResource, Resource, ResourceError, ResourceState};
pub use retry::{
    retry, retry_with_context, NoopObserver, RetryEvent, RetryExecutor, RetryExhausted,
    RetryObserver, RetryPolicy, TracingObserver,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::context::{Context, ContextDone};
    pub use crate::lifecycle::{App, Hook, Lifecycle, LifecycleConfig, LifecycleError};
    pub use crate::resource::{ManagedResource, Resource, ResourceError, ResourceState};
    pub use crate::retry::{
        retry, retry_with_context, RetryExecutor, RetryExhausted, RetryObserver, RetryPolicy,
        TracingObserver,
    };
}
