//! Timeouts applied by the lifecycle host.

use std::time::Duration;

/// Default budget for the whole start sequence.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(15);

/// Default budget for the whole stop sequence.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for an [`App`](super::App).
///
/// # Examples
///
/// ```rust
/// use mooring::LifecycleConfig;
/// use std::time::Duration;
///
/// let config = LifecycleConfig::default().with_start_timeout(Duration::from_secs(30));
/// assert_eq!(config.start_timeout, Duration::from_secs(30));
/// assert_eq!(config.stop_timeout, Duration::from_secs(15));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LifecycleConfig {
    /// Deadline for running every OnStart hook.
    pub start_timeout: Duration,
    /// Deadline for running every OnStop hook.
    pub stop_timeout: Duration,
}

impl LifecycleConfig {
    /// Replace the start timeout.
    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    /// Replace the stop timeout.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout: DEFAULT_START_TIMEOUT,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_config() {
        let config: LifecycleConfig =
            serde_json::from_str(r#"{"stop_timeout": {"secs": 2, "nanos": 0}}"#).unwrap();

        assert_eq!(config.start_timeout, DEFAULT_START_TIMEOUT);
        assert_eq!(config.stop_timeout, Duration::from_secs(2));
    }
}
