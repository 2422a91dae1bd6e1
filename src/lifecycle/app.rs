//! The ordered start/stop host.

use std::fmt;
use std::future::Future;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::config::LifecycleConfig;
use super::error::{HookFailure, LifecycleError};
use super::hook::{BoxError, Hook, HookFn, Lifecycle};
use super::signals::wait_for_shutdown_signal;
use crate::context::Context;

/// Where an [`App`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppState {
    /// Hooks may be appended; nothing has run yet.
    Created,
    /// Every OnStart hook succeeded.
    Started,
    /// Shutdown ran, or was abandoned part way. Terminal.
    Stopped,
    /// Startup failed or was abandoned part way. Terminal.
    Failed,
}

impl fmt::Display for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppState::Created => "created",
            AppState::Started => "started",
            AppState::Stopped => "stopped",
            AppState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// A started hook waiting for its OnStop turn.
struct Started {
    name: String,
    on_stop: Option<HookFn>,
}

/// Host that runs registered hooks in order at startup and in reverse
/// order at shutdown.
///
/// - `start` runs every OnStart slot under `start_timeout`. The first
///   failure rolls back the hooks already started and aborts startup.
/// - `stop` runs the OnStop slot of every started hook, newest first, under
///   `stop_timeout`, and keeps going past failures.
///
/// # Examples
///
/// ```rust
/// use mooring::{App, AppState, Context, Hook, Lifecycle};
///
/// # tokio_test::block_on(async {
/// let mut app = App::new();
/// app.append(Hook::new("noop"));
///
/// app.start(&Context::background()).await.unwrap();
/// assert_eq!(app.state(), AppState::Started);
///
/// app.stop(&Context::background()).await.unwrap();
/// assert_eq!(app.state(), AppState::Stopped);
/// # });
/// ```
pub struct App {
    config: LifecycleConfig,
    pending: Vec<Hook>,
    started: Vec<Started>,
    state: AppState,
}

impl App {
    /// Create an app with the default timeouts.
    pub fn new() -> Self {
        Self::with_config(LifecycleConfig::default())
    }

    /// Create an app with explicit timeouts.
    pub fn with_config(config: LifecycleConfig) -> Self {
        App {
            config,
            pending: Vec::new(),
            started: Vec::new(),
            state: AppState::Created,
        }
    }

    /// The timeouts this app applies.
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// The current state.
    pub fn state(&self) -> AppState {
        self.state
    }

    /// Number of hooks registered and not yet started.
    pub fn pending_hooks(&self) -> usize {
        self.pending.len()
    }

    /// Run every OnStart hook in registration order.
    ///
    /// `ctx` is narrowed to `start_timeout`; a hook still running at the
    /// deadline is dropped and fails with
    /// [`ContextDone::DeadlineExceeded`](crate::ContextDone::DeadlineExceeded).
    ///
    /// Dropping the returned future part way leaves the app
    /// [`AppState::Failed`]; hooks that had already started are not stopped.
    pub async fn start(&mut self, ctx: &Context) -> Result<(), LifecycleError> {
        // A start future dropped before completion leaves the app Failed.
        self.transition("start", AppState::Created, AppState::Failed)?;

        let start_ctx = ctx.with_timeout(self.config.start_timeout);
        let hooks = std::mem::take(&mut self.pending);

        for hook in hooks {
            let (name, on_start, on_stop) = hook.into_parts();

            if let Some(on_start) = on_start {
                if let Err(source) = run_hook("OnStart", &name, on_start, &start_ctx).await {
                    error!(hook = %name, error = %source, "OnStart hook failed, rolling back");
                    let rollback_ctx = ctx.with_timeout(self.config.stop_timeout);
                    let rollback = self.stop_started(&rollback_ctx).await;
                    self.state = AppState::Failed;
                    return Err(LifecycleError::Start {
                        hook: name,
                        source,
                        rollback,
                    });
                }
            }

            self.started.push(Started { name, on_stop });
        }

        self.state = AppState::Started;
        info!(hooks = self.started.len(), "started");
        Ok(())
    }

    /// Run the OnStop hook of every started hook, newest first.
    pub async fn stop(&mut self, ctx: &Context) -> Result<(), LifecycleError> {
        // Likewise a dropped stop leaves it Stopped.
        self.transition("stop", AppState::Started, AppState::Stopped)?;

        let stop_ctx = ctx.with_timeout(self.config.stop_timeout);
        let failures = self.stop_started(&stop_ctx).await;

        self.state = AppState::Stopped;
        if failures.is_empty() {
            info!("stopped");
            Ok(())
        } else {
            Err(LifecycleError::Stop { failures })
        }
    }

    /// Start, wait for `shutdown` to complete, then stop.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), LifecycleError>
    where
        F: Future,
    {
        self.start(&Context::background()).await?;
        shutdown.await;
        self.stop(&Context::background()).await
    }

    /// Start, wait for a termination signal, then stop.
    pub async fn run(mut self) -> Result<(), LifecycleError> {
        self.start(&Context::background()).await?;
        let signal = wait_for_shutdown_signal().await;
        let stopped = self.stop(&Context::background()).await;
        signal.map_err(LifecycleError::Signal)?;
        stopped
    }

    fn transition(
        &mut self,
        operation: &'static str,
        from: AppState,
        to: AppState,
    ) -> Result<(), LifecycleError> {
        if self.state != from {
            return Err(LifecycleError::InvalidState {
                operation,
                state: self.state,
            });
        }
        self.state = to;
        Ok(())
    }

    async fn stop_started(&mut self, ctx: &Context) -> Vec<HookFailure> {
        let mut failures = Vec::new();
        while let Some(Started { name, on_stop }) = self.started.pop() {
            let Some(on_stop) = on_stop else {
                continue;
            };
            if let Err(error) = run_hook("OnStop", &name, on_stop, ctx).await {
                warn!(hook = %name, error = %error, "OnStop hook failed");
                failures.push(HookFailure { hook: name, error });
            }
        }
        failures
    }
}

async fn run_hook(
    phase: &'static str,
    name: &str,
    hook: HookFn,
    ctx: &Context,
) -> Result<(), BoxError> {
    debug!(hook = %name, phase, "hook executing");
    let began = Instant::now();

    let result = match ctx.run(hook(ctx.clone())).await {
        Ok(result) => result,
        Err(done) => Err(done.into()),
    };

    if result.is_ok() {
        info!(hook = %name, phase, runtime = ?began.elapsed(), "hook executed");
    }
    result
}

impl Lifecycle for App {
    fn append(&mut self, hook: Hook) {
        if self.state != AppState::Created {
            warn!(hook = hook.name(), state = %self.state, "hook appended after start will never run");
        }
        self.pending.push(hook);
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("config", &self.config)
            .field("pending", &self.pending)
            .field("started", &self.started.len())
            .field("state", &self.state)
            .finish()
    }
}
