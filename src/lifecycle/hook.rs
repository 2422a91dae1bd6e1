//! Lifecycle hooks and the registration capability.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::context::Context;

/// Type-erased error returned by hook callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Future produced by a hook callback.
pub type HookFuture = BoxFuture<'static, Result<(), BoxError>>;

/// A boxed OnStart or OnStop callback.
pub type HookFn = Box<dyn FnOnce(Context) -> HookFuture + Send + 'static>;

/// A pair of optional callbacks run by the host at startup and shutdown.
///
/// Each slot is invoked at most once.
///
/// # Examples
///
/// ```rust
/// use mooring::{App, Context, Hook, Lifecycle};
///
/// # tokio_test::block_on(async {
/// let mut app = App::new();
/// app.append(
///     Hook::new("greeter")
///         .on_start(|_ctx: Context| async { println!("hello"); Ok::<_, std::io::Error>(()) })
///         .on_stop(|_ctx: Context| async { println!("bye"); Ok::<_, std::io::Error>(()) }),
/// );
///
/// app.start(&Context::background()).await.unwrap();
/// app.stop(&Context::background()).await.unwrap();
/// # });
/// ```
pub struct Hook {
    name: String,
    pub(crate) on_start: Option<HookFn>,
    pub(crate) on_stop: Option<HookFn>,
}

impl Hook {
    /// Create a hook with both slots empty.
    pub fn new(name: impl Into<String>) -> Self {
        Hook {
            name: name.into(),
            on_start: None,
            on_stop: None,
        }
    }

    /// Fill the OnStart slot.
    pub fn on_start<F, Fut, E>(mut self, f: F) -> Self
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.on_start = Some(erase(f));
        self
    }

    /// Fill the OnStop slot.
    pub fn on_stop<F, Fut, E>(mut self, f: F) -> Self
    where
        F: FnOnce(Context) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError>,
    {
        self.on_stop = Some(erase(f));
        self
    }

    /// The name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the OnStart slot is filled.
    pub fn has_on_start(&self) -> bool {
        self.on_start.is_some()
    }

    /// Returns true if the OnStop slot is filled.
    pub fn has_on_stop(&self) -> bool {
        self.on_stop.is_some()
    }

    pub(crate) fn into_parts(self) -> (String, Option<HookFn>, Option<HookFn>) {
        (self.name, self.on_start, self.on_stop)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook")
            .field("name", &self.name)
            .field("on_start", &self.has_on_start())
            .field("on_stop", &self.has_on_stop())
            .finish()
    }
}

fn erase<F, Fut, E>(f: F) -> HookFn
where
    F: FnOnce(Context) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: Into<BoxError>,
{
    Box::new(move |ctx| f(ctx).map(|result| result.map_err(Into::into)).boxed())
}

/// Something hooks can be registered with.
///
/// This is the only capability a [`ManagedResource`](crate::ManagedResource)
/// needs from its host. OnStart hooks run in registration order; OnStop
/// hooks run in reverse.
pub trait Lifecycle {
    /// Register a hook.
    fn append(&mut self, hook: Hook);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hook_slots() {
        let hook = Hook::new("db").on_start(|_ctx| async { Ok::<_, BoxError>(()) });

        assert_eq!(hook.name(), "db");
        assert!(hook.has_on_start());
        assert!(!hook.has_on_stop());
    }

    #[tokio::test]
    async fn test_erased_error_is_preserved() {
        let hook = Hook::new("db").on_stop(|_ctx| async {
            Err(std::io::Error::other("close failed"))
        });

        let stop = hook.on_stop.expect("on_stop set");
        let err = stop(Context::background()).await.unwrap_err();

        assert_eq!(err.to_string(), "close failed");
    }

    #[test]
    fn test_debug_hides_callbacks() {
        let hook = Hook::new("cache");
        let debug = format!("{:?}", hook);
        assert!(debug.contains("cache"));
        assert!(debug.contains("on_start: false"));
    }
}
