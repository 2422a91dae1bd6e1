//! A small host-managed application lifecycle.
//!
//! Components register [`Hook`]s through the [`Lifecycle`] capability. The
//! [`App`] host then:
//!
//! 1. runs every OnStart slot in registration order, under a start deadline
//! 2. aborts startup on the first failing OnStart and rolls back the hooks
//!    that had already started
//! 3. at shutdown, runs every OnStop slot in reverse order under a stop
//!    deadline, collecting failures instead of stopping at the first
//!
//! ```text
//! append(a), append(b), append(c)
//!
//! start:  a.on_start -> b.on_start -> c.on_start
//! stop:   c.on_stop  -> b.on_stop  -> a.on_stop
//! ```
//!
//! # Example
//!
//! ```rust
//! use mooring::{App, Context, Hook, Lifecycle, LifecycleConfig};
//! use std::time::Duration;
//!
//! # tokio_test::block_on(async {
//! let config = LifecycleConfig::default().with_start_timeout(Duration::from_secs(5));
//! let mut app = App::with_config(config);
//!
//! app.append(Hook::new("server").on_start(|ctx: Context| async move {
//!     assert!(ctx.deadline().is_some());
//!     Ok::<_, std::io::Error>(())
//! }));
//!
//! app.run_until(async {}).await.unwrap();
//! # });
//! ```

mod app;
mod config;
mod error;
mod hook;
mod signals;

pub use app::{App, AppState};
pub use config::{LifecycleConfig, DEFAULT_START_TIMEOUT, DEFAULT_STOP_TIMEOUT};
pub use error::{HookFailure, LifecycleError};
pub use hook::{BoxError, Hook, HookFn, HookFuture, Lifecycle};
pub use signals::wait_for_shutdown_signal;
