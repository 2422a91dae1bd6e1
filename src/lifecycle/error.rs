//! Errors reported by the lifecycle host.

use std::error::Error as StdError;
use std::fmt;

use super::app::AppState;
use super::hook::BoxError;

/// A single hook callback that returned an error.
#[derive(Debug)]
pub struct HookFailure {
    /// Name of the failing hook.
    pub hook: String,
    /// The error it returned.
    pub error: BoxError,
}

impl fmt::Display for HookFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.hook, self.error)
    }
}

/// Error returned by [`App::start`](super::App::start),
/// [`App::stop`](super::App::stop) and friends.
#[derive(Debug)]
pub enum LifecycleError {
    /// An OnStart hook failed. Hooks started before it were rolled back.
    Start {
        /// Name of the hook that failed.
        hook: String,
        /// Its error.
        source: BoxError,
        /// OnStop failures hit while rolling back.
        rollback: Vec<HookFailure>,
    },
    /// One or more OnStop hooks failed. Every hook was still given its turn.
    Stop {
        /// Failures in the order they happened.
        failures: Vec<HookFailure>,
    },
    /// The operation is not allowed in the app's current state.
    InvalidState {
        /// What was attempted.
        operation: &'static str,
        /// The state the app was in.
        state: AppState,
    },
    /// Installing the OS signal listeners failed.
    Signal(std::io::Error),
}

impl LifecycleError {
    /// Name of the hook that aborted startup, if this is a start error.
    pub fn failed_hook(&self) -> Option<&str> {
        match self {
            LifecycleError::Start { hook, .. } => Some(hook),
            _ => None,
        }
    }
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecycleError::Start {
                hook,
                source,
                rollback,
            } => {
                write!(f, "OnStart hook `{}` failed: {}", hook, source)?;
                if !rollback.is_empty() {
                    write!(f, " (rollback failures: {})", join(rollback))?;
                }
                Ok(())
            }
            LifecycleError::Stop { failures } => {
                write!(f, "{} OnStop hook(s) failed: {}", failures.len(), join(failures))
            }
            LifecycleError::InvalidState { operation, state } => {
                write!(f, "cannot {} an app that is {}", operation, state)
            }
            LifecycleError::Signal(e) => write!(f, "failed to listen for shutdown signal: {}", e),
        }
    }
}

impl StdError for LifecycleError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            LifecycleError::Start { source, .. } => {
                Some(source.as_ref() as &(dyn StdError + 'static))
            }
            LifecycleError::Stop { failures } => failures
                .first()
                .map(|failure| failure.error.as_ref() as &(dyn StdError + 'static)),
            LifecycleError::InvalidState { .. } => None,
            LifecycleError::Signal(e) => Some(e),
        }
    }
}

fn join(failures: &[HookFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
