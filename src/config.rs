//! Configuration System
//!
//! Layered settings for waiting behaviour, template option defaults and logging.
//! Sources are merged by [`ConfigLoader`]: built-in defaults, the user's global
//! file, workspace files and finally `PAGEMODEL__*` environment variables.

use crate::logging::LoggingConfig;
use crate::wait::{UnknownPreset, Wait, WaitPolicy, WaitSetting};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

mod loader;
mod merge;
mod sources;

pub use loader::ConfigLoader;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageModelConfig {
    /// Wait timeouts, retry intervals and presets
    #[serde(default)]
    pub waiting: WaitingConfig,

    /// Defaults for template options a declaration leaves unset
    #[serde(default)]
    pub defaults: TemplateDefaults,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Wait configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitingConfig {
    /// Default timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Default delay between polls in seconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval: f64,

    /// Named presets usable as `wait: "<name>"`
    #[serde(default)]
    pub presets: HashMap<String, WaitPreset>,

    /// Waiting applied when verifying a page's at check
    #[serde(default)]
    pub at_check: Option<WaitSetting>,
}

/// Named wait preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaitPreset {
    pub timeout: f64,
    #[serde(default)]
    pub retry_interval: Option<f64>,
}

/// Template option defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateDefaults {
    #[serde(default = "default_true")]
    pub cache: bool,

    #[serde(default = "default_true")]
    pub required: bool,

    #[serde(default)]
    pub wait: Option<WaitSetting>,

    #[serde(default)]
    pub min: Option<usize>,

    #[serde(default)]
    pub max: Option<usize>,
}

fn default_timeout() -> f64 {
    5.0
}

fn default_retry_interval() -> f64 {
    0.1
}

fn default_true() -> bool {
    true
}

impl Default for WaitingConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retry_interval: default_retry_interval(),
            presets: HashMap::new(),
            at_check: None,
        }
    }
}

impl Default for TemplateDefaults {
    fn default() -> Self {
        Self {
            cache: true,
            required: true,
            wait: None,
            min: None,
            max: None,
        }
    }
}

impl WaitingConfig {
    /// Policy used by `Wait::Default`
    pub fn default_policy(&self) -> WaitPolicy {
        WaitPolicy {
            timeout: Duration::from_secs_f64(self.timeout),
            retry_interval: Duration::from_secs_f64(self.retry_interval),
        }
    }

    /// Resolve a wait setting to a concrete policy; `None` means do not wait.
    pub fn policy(&self, wait: &Wait) -> Result<Option<WaitPolicy>, UnknownPreset> {
        match wait {
            Wait::Disabled => Ok(None),
            Wait::Default => Ok(Some(self.default_policy())),
            Wait::Timeout(timeout) => Ok(Some(WaitPolicy {
                timeout: *timeout,
                retry_interval: Duration::from_secs_f64(self.retry_interval),
            })),
            Wait::Preset(name) => {
                let preset = self
                    .presets
                    .get(name)
                    .ok_or_else(|| UnknownPreset(name.clone()))?;
                Ok(Some(WaitPolicy {
                    timeout: Duration::from_secs_f64(preset.timeout),
                    retry_interval: Duration::from_secs_f64(
                        preset.retry_interval.unwrap_or(self.retry_interval),
                    ),
                }))
            }
        }
    }

    /// Validate waiting configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if !valid_timeout(self.timeout) {
            errors.push(ValidationError::Waiting(format!(
                "timeout must be a non-negative number of seconds, got {}",
                self.timeout
            )));
        }
        if !valid_interval(self.retry_interval) {
            errors.push(ValidationError::Waiting(format!(
                "retry_interval must be a positive number of seconds, got {}",
                self.retry_interval
            )));
        }

        for (name, preset) in &self.presets {
            if !valid_timeout(preset.timeout) {
                errors.push(ValidationError::Preset(
                    name.clone(),
                    format!("timeout must be non-negative, got {}", preset.timeout),
                ));
            }
            if let Some(interval) = preset.retry_interval {
                if !valid_interval(interval) {
                    errors.push(ValidationError::Preset(
                        name.clone(),
                        format!("retry_interval must be positive, got {}", interval),
                    ));
                }
            }
        }

        if let Some(WaitSetting::Preset(name)) = &self.at_check {
            if !self.presets.contains_key(name) {
                errors.push(ValidationError::Waiting(format!(
                    "at_check refers to unknown preset '{}'",
                    name
                )));
            }
        }
        if let Some(WaitSetting::Seconds(seconds)) = &self.at_check {
            if !valid_timeout(*seconds) {
                errors.push(ValidationError::Waiting(format!(
                    "at_check timeout must be non-negative, got {}",
                    seconds
                )));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn valid_timeout(seconds: f64) -> bool {
    seconds.is_finite() && seconds >= 0.0
}

fn valid_interval(seconds: f64) -> bool {
    seconds.is_finite() && seconds > 0.0
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    Waiting(String),
    Preset(String, String),
    Defaults(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Waiting(msg) => write!(f, "Waiting: {}", msg),
            ValidationError::Preset(name, msg) => write!(f, "Wait preset '{}': {}", name, msg),
            ValidationError::Defaults(msg) => write!(f, "Defaults: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl PageModelConfig {
    /// Validate the entire configuration, reporting every problem found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Err(mut waiting) = self.waiting.validate() {
            errors.append(&mut waiting);
        }

        if let (Some(min), Some(max)) = (self.defaults.min, self.defaults.max) {
            if min > max {
                errors.push(ValidationError::Defaults(format!(
                    "min ({}) is greater than max ({})",
                    min, max
                )));
            }
        }

        match &self.defaults.wait {
            Some(WaitSetting::Preset(name)) if !self.waiting.presets.contains_key(name) => {
                errors.push(ValidationError::Defaults(format!(
                    "wait refers to unknown preset '{}'",
                    name
                )));
            }
            Some(WaitSetting::Seconds(seconds)) if !valid_timeout(*seconds) => {
                errors.push(ValidationError::Defaults(format!(
                    "wait timeout must be non-negative, got {}",
                    seconds
                )));
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
