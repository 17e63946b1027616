//! Waiting: settings, policies and the polling collaborator.

use crate::error::{ContentError, WaitError};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::trace;

/// Wait setting declared on a template
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Wait {
    /// Resolve once, never poll
    #[default]
    Disabled,
    /// Poll with the configured default timeout and interval
    Default,
    /// Poll for an explicit duration with the default interval
    Timeout(Duration),
    /// Poll with a named preset from the waiting configuration
    Preset(String),
}

impl From<bool> for Wait {
    fn from(enabled: bool) -> Self {
        if enabled {
            Wait::Default
        } else {
            Wait::Disabled
        }
    }
}

impl From<Duration> for Wait {
    fn from(timeout: Duration) -> Self {
        Wait::Timeout(timeout)
    }
}

impl From<&str> for Wait {
    fn from(preset: &str) -> Self {
        Wait::Preset(preset.to_string())
    }
}

/// Wait setting as written in configuration files: `true`, `2.5` or `"slow"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaitSetting {
    Enabled(bool),
    Seconds(f64),
    Preset(String),
}

impl From<&WaitSetting> for Wait {
    fn from(setting: &WaitSetting) -> Self {
        match setting {
            WaitSetting::Enabled(enabled) => Wait::from(*enabled),
            WaitSetting::Seconds(seconds) => {
                Wait::Timeout(
                    Duration::try_from_secs_f64(seconds.max(0.0)).unwrap_or(Duration::MAX),
                )
            }
            WaitSetting::Preset(name) => Wait::Preset(name.clone()),
        }
    }
}

/// Wait setting named a preset missing from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPreset(pub String);

/// Concrete timeout and poll interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub retry_interval: Duration,
}

/// Blocks until a condition holds or the policy's timeout elapses
///
/// Implementations must evaluate the condition at least once and must not
/// report a timeout before `policy.timeout` has elapsed. Errors returned by
/// the condition end the wait immediately as [`WaitError::Failed`].
pub trait Waiter: Send + Sync {
    fn wait_until(
        &self,
        policy: &WaitPolicy,
        condition: &mut dyn FnMut() -> Result<bool, ContentError>,
    ) -> Result<(), WaitError>;
}

/// Waiter that sleeps on the calling thread between polls
#[derive(Debug, Clone, Copy, Default)]
pub struct PollingWaiter;

impl Waiter for PollingWaiter {
    fn wait_until(
        &self,
        policy: &WaitPolicy,
        condition: &mut dyn FnMut() -> Result<bool, ContentError>,
    ) -> Result<(), WaitError> {
        let start = Instant::now();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if condition().map_err(|e| WaitError::Failed(Box::new(e)))? {
                trace!(attempts, "Wait condition satisfied");
                return Ok(());
            }

            let elapsed = start.elapsed();
            if elapsed >= policy.timeout {
                return Err(WaitError::TimedOut { elapsed, attempts });
            }

            let remaining = policy.timeout - elapsed;
            std::thread::sleep(policy.retry_interval.min(remaining));
        }
    }
}
