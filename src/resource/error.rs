//! Errors raised while bringing a resource up.

use std::error::Error as StdError;
use std::fmt;

use super::ResourceState;
use crate::retry::RetryExhausted;

/// Failure to construct or activate a [`Resource`](super::Resource).
///
/// Configuration and construction errors are raised synchronously and never
/// retried. Activation errors surface only once the retry budget is spent
/// and carry the last probe error. Release errors never appear here: they
/// are logged and dropped.
#[derive(Debug)]
pub enum ResourceError<E> {
    /// The raw configuration could not be parsed.
    Configuration {
        /// [`Resource::NAME`](super::Resource::NAME) of the resource.
        resource: &'static str,
        /// The parser's error.
        source: E,
    },
    /// The handle could not be allocated from a valid configuration.
    Construction {
        /// [`Resource::NAME`](super::Resource::NAME) of the resource.
        resource: &'static str,
        /// The constructor's error.
        source: E,
    },
    /// Every activation probe failed.
    Activation {
        /// [`Resource::NAME`](super::Resource::NAME) of the resource.
        resource: &'static str,
        /// The final probe error and retry metadata.
        source: RetryExhausted<E>,
    },
    /// Activation was requested from a terminal state.
    InvalidState {
        /// [`Resource::NAME`](super::Resource::NAME) of the resource.
        resource: &'static str,
        /// The state the resource was in.
        state: ResourceState,
    },
}

impl<E> ResourceError<E> {
    /// Name of the resource the error belongs to.
    pub fn resource(&self) -> &'static str {
        match self {
            ResourceError::Configuration { resource, .. }
            | ResourceError::Construction { resource, .. }
            | ResourceError::Activation { resource, .. }
            | ResourceError::InvalidState { resource, .. } => *resource,
        }
    }

    /// Returns true for errors raised before any hook was registered.
    pub fn is_construction_phase(&self) -> bool {
        matches!(
            self,
            ResourceError::Configuration { .. } | ResourceError::Construction { .. }
        )
    }

    /// The underlying resource error, if there is one.
    pub fn inner(&self) -> Option<&E> {
        match self {
            ResourceError::Configuration { source, .. }
            | ResourceError::Construction { source, .. } => Some(source),
            ResourceError::Activation { source, .. } => Some(source.error()),
            ResourceError::InvalidState { .. } => None,
        }
    }
}

impl<E: fmt::Display> fmt::Display for ResourceError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Configuration { resource, source } => {
                write!(f, "error while parsing {} configuration: {}", resource, source)
            }
            ResourceError::Construction { resource, source } => {
                write!(f, "{}: init: {}", resource, source)
            }
            ResourceError::Activation { resource, source } => {
                write!(f, "{}: activation failed: {}", resource, source)
            }
            ResourceError::InvalidState { resource, state } => {
                write!(f, "{}: cannot activate a resource that is {}", resource, state)
            }
        }
    }
}

impl<E: StdError + 'static> StdError for ResourceError<E> {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ResourceError::Configuration { source, .. }
            | ResourceError::Construction { source, .. } => Some(source),
            ResourceError::Activation { source, .. } => Some(source),
            ResourceError::InvalidState { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_configuration_display() {
        let err = ResourceError::Configuration {
            resource: "postgres",
            source: io::Error::new(io::ErrorKind::InvalidInput, "missing host"),
        };
        assert_eq!(
            err.to_string(),
            "error while parsing postgres configuration: missing host"
        );
        assert!(err.is_construction_phase());
        assert_eq!(err.resource(), "postgres");
    }

    #[test]
    fn test_activation_wraps_last_error() {
        let err = ResourceError::Activation {
            resource: "postgres",
            source: RetryExhausted::new(
                io::Error::new(io::ErrorKind::ConnectionRefused, "refused #5"),
                5,
                Duration::from_secs(12),
            ),
        };

        assert!(!err.is_construction_phase());
        assert_eq!(err.inner().map(|e| e.to_string()), Some("refused #5".into()));
        assert!(err.to_string().contains("5 attempts"));

        let source = err.source().expect("activation has a source");
        assert!(source.to_string().contains("retry exhausted"));
    }

    #[test]
    fn test_invalid_state_has_no_inner() {
        let err: ResourceError<io::Error> = ResourceError::InvalidState {
            resource: "cache",
            state: ResourceState::Released,
        };
        assert!(err.inner().is_none());
        assert!(err.source().is_none());
        assert_eq!(
            err.to_string(),
            "cache: cannot activate a resource that is released"
        );
    }
}
