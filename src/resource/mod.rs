//! Lifecycle-gated resource initialization.
//!
//! A [`Resource`] is something like a connection pool: built synchronously
//! from a configuration string, usable only once its backend is reachable,
//! and released at shutdown. [`ManagedResource`] binds the three phases to a
//! [`Lifecycle`](crate::Lifecycle):
//!
//! ```text
//! raw config --parse--> Config --construct--> handle      (fail fast, no retry)
//!                                               |
//!                         register OnStart/OnStop with the host
//!                                               |
//! OnStart: probe via retry_with_context, default 5 x 3s   (Constructed -> Active | ActivationFailed)
//! OnStop:  release, errors swallowed                      (Active -> Released)
//! ```
//!
//! # Example
//!
//! ```rust
//! use mooring::testing::MockResource;
//! use mooring::{App, Context, ManagedResource};
//!
//! # tokio_test::block_on(async {
//! let mut app = App::new();
//! let pool = ManagedResource::<MockResource>::provide(&mut app, "mock://db").unwrap();
//!
//! app.start(&Context::background()).await.unwrap();
//! assert_eq!(pool.probe_count(), 1);
//! app.stop(&Context::background()).await.unwrap();
//! assert_eq!(pool.release_count(), 1);
//! # });
//! ```

mod error;
mod managed;

pub use error::ResourceError;
pub use managed::ManagedResource;

use std::fmt;
use std::future::Future;

use crate::context::Context;

/// A poolable resource whose readiness is verified at startup.
///
/// Implementors supply the construction steps and the two capabilities the
/// lifecycle needs: a reachability probe and a release action.
pub trait Resource: Send + Sync + Sized + 'static {
    /// Short name used in logs, hook names and errors.
    const NAME: &'static str;

    /// Parsed configuration.
    type Config: Send;

    /// Error produced by every step.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Parse the raw configuration string.
    fn parse_config(raw: &str) -> Result<Self::Config, Self::Error>;

    /// Build the handle. Must not wait for the backend to be reachable.
    fn construct(config: Self::Config) -> Result<Self, Self::Error>;

    /// Check that the backend is reachable right now.
    ///
    /// Implementations should honour `ctx`, typically via [`Context::run`].
    fn probe(&self, ctx: &Context) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Release the handle. Errors are logged by the caller, never propagated.
    fn release(&self, ctx: &Context) -> impl Future<Output = Result<(), Self::Error>> + Send;
}

/// Where a [`ManagedResource`] is in its lifecycle.
///
/// ```text
/// Constructed -> Activating -> Active -> Released
///      |              \
///      |               -> ActivationFailed
///      -> Released
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Built, not yet probed.
    Constructed,
    /// The activation probe loop is running.
    Activating,
    /// A probe succeeded; the handle is ready for use.
    Active,
    /// The probe budget ran out. Terminal.
    ActivationFailed,
    /// The handle was released. Terminal.
    Released,
}

impl ResourceState {
    /// Returns true if no further transition is possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResourceState::ActivationFailed | ResourceState::Released)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResourceState::Constructed => "constructed",
            ResourceState::Activating => "activating",
            ResourceState::Active => "active",
            ResourceState::ActivationFailed => "activation failed",
            ResourceState::Released => "released",
        };
        f.write_str(s)
    }
}
