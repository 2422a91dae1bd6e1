//! The owner object tying a resource to a lifecycle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};

use super::{Resource, ResourceError, ResourceState};
use crate::context::Context;
use crate::lifecycle::{BoxError, Hook, Lifecycle};
use crate::retry::{retry_with_context, RetryObserver, RetryPolicy, TracingObserver};

type SharedObserver<E> = Arc<dyn RetryObserver<E> + Send + Sync>;

/// Owns a constructed resource and its activate/release pair.
///
/// Built with [`open`](Self::open), optionally tuned with
/// [`with_policy`](Self::with_policy) and
/// [`with_observer`](Self::with_observer), then bound to a host with
/// [`register`](Self::register). [`provide`](Self::provide) does all three
/// with the defaults.
///
/// # Examples
///
/// ```rust
/// use mooring::testing::MockResource;
/// use mooring::{App, Context, ManagedResource, ResourceState, RetryPolicy};
/// use std::time::Duration;
///
/// # tokio_test::block_on(async {
/// let mut app = App::new();
/// let owner = ManagedResource::<MockResource>::open("mock://db?fail=2")
///     .unwrap()
///     .with_policy(RetryPolicy::new(3, Duration::from_millis(1)))
///     .register(&mut app);
///
/// assert_eq!(owner.state(), ResourceState::Constructed);
/// app.start(&Context::background()).await.unwrap();
/// assert_eq!(owner.state(), ResourceState::Active);
/// assert_eq!(owner.handle().probe_count(), 3);
/// # });
/// ```
pub struct ManagedResource<R: Resource> {
    resource: Arc<R>,
    policy: RetryPolicy,
    observer: SharedObserver<R::Error>,
    state: Mutex<ResourceState>,
    released: AtomicBool,
}

impl<R: Resource> ManagedResource<R> {
    /// Parse `raw_config` and construct the resource.
    ///
    /// Neither step is retried. On success an info event records that the
    /// handle exists; it is not usable until activated.
    pub fn open(raw_config: &str) -> Result<Self, ResourceError<R::Error>> {
        let config = R::parse_config(raw_config).map_err(|source| {
            ResourceError::Configuration {
                resource: R::NAME,
                source,
            }
        })?;
        let resource = R::construct(config).map_err(|source| ResourceError::Construction {
            resource: R::NAME,
            source,
        })?;

        info!(resource = R::NAME, "created {} client", R::NAME);
        Ok(Self::from_resource(resource))
    }

    /// Wrap a handle that was constructed elsewhere.
    pub fn from_resource(resource: R) -> Self {
        ManagedResource {
            resource: Arc::new(resource),
            policy: RetryPolicy::default(),
            observer: Arc::new(TracingObserver::new(R::NAME)),
            state: Mutex::new(ResourceState::Constructed),
            released: AtomicBool::new(false),
        }
    }

    /// Replace the activation retry policy.
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the observer that receives failed activation probes.
    pub fn with_observer<O>(mut self, observer: O) -> Self
    where
        O: RetryObserver<R::Error> + Send + Sync + 'static,
    {
        self.observer = Arc::new(observer);
        self
    }

    /// Register the OnStart/OnStop pair with `lifecycle`.
    ///
    /// The hook is named after [`Resource::NAME`]. The returned owner is
    /// shared with the hook callbacks.
    pub fn register<L>(self, lifecycle: &mut L) -> Arc<Self>
    where
        L: Lifecycle + ?Sized,
    {
        let owner = Arc::new(self);
        let on_start = Arc::clone(&owner);
        let on_stop = Arc::clone(&owner);

        lifecycle.append(
            Hook::new(R::NAME)
                .on_start(move |ctx: Context| async move { on_start.activate(&ctx).await })
                .on_stop(move |ctx: Context| async move {
                    on_stop.release(&ctx).await;
                    Ok::<_, BoxError>(())
                }),
        );
        debug!(resource = R::NAME, "registered lifecycle hooks");

        owner
    }

    /// Open, register with the defaults, and hand back the resource handle.
    ///
    /// # Errors
    ///
    /// Configuration and construction failures are returned immediately and
    /// no hook is registered.
    pub fn provide<L>(lifecycle: &mut L, raw_config: &str) -> Result<Arc<R>, ResourceError<R::Error>>
    where
        L: Lifecycle + ?Sized,
    {
        let owner = Self::open(raw_config)?.register(lifecycle);
        Ok(owner.handle())
    }

    /// A shared reference to the resource handle.
    pub fn handle(&self) -> Arc<R> {
        Arc::clone(&self.resource)
    }

    /// The activation retry policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// The current lifecycle state.
    pub fn state(&self) -> ResourceState {
        *self.lock_state()
    }

    /// Probe the resource until it answers or the policy gives up.
    ///
    /// Each failed probe is reported to the observer. Activating an already
    /// active resource succeeds without probing again; activating from a
    /// terminal state fails with [`ResourceError::InvalidState`].
    pub async fn activate(&self, ctx: &Context) -> Result<(), ResourceError<R::Error>> {
        if !self.begin_activation()? {
            return Ok(());
        }

        let result = retry_with_context(
            ctx,
            |ctx| {
                let resource = Arc::clone(&self.resource);
                async move { resource.probe(&ctx).await }
            },
            &self.policy,
            self.observer.as_ref(),
        )
        .await;

        match result {
            Ok(()) => {
                self.set_state(ResourceState::Active);
                info!(resource = R::NAME, "{} is ready", R::NAME);
                Ok(())
            }
            Err(exhausted) => {
                self.set_state(ResourceState::ActivationFailed);
                Err(ResourceError::Activation {
                    resource: R::NAME,
                    source: exhausted,
                })
            }
        }
    }

    /// Release the resource. Never fails.
    ///
    /// Only the first call reaches the resource; later calls are no-ops.
    /// Release errors are logged and dropped.
    pub async fn release(&self, ctx: &Context) {
        if self.released.swap(true, Ordering::SeqCst) {
            debug!(resource = R::NAME, "already released");
            return;
        }

        if let Err(error) = self.resource.release(ctx).await {
            warn!(resource = R::NAME, error = %error, "error while releasing {}", R::NAME);
        }

        let mut state = self.lock_state();
        if *state != ResourceState::ActivationFailed {
            *state = ResourceState::Released;
        }
        info!(resource = R::NAME, "released {}", R::NAME);
    }

    /// Move to `Activating`. Returns false if already active.
    fn begin_activation(&self) -> Result<bool, ResourceError<R::Error>> {
        let mut state = self.lock_state();
        match *state {
            ResourceState::Constructed => {
                *state = ResourceState::Activating;
                Ok(true)
            }
            ResourceState::Active => Ok(false),
            other => Err(ResourceError::InvalidState {
                resource: R::NAME,
                state: other,
            }),
        }
    }

    fn set_state(&self, next: ResourceState) {
        *self.lock_state() = next;
    }

    fn lock_state(&self) -> MutexGuard<'_, ResourceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Resource> fmt::Debug for ManagedResource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedResource")
            .field("resource", &R::NAME)
            .field("policy", &self.policy)
            .field("state", &self.state())
            .finish()
    }
}
