//! Error types for the page content engine.

use crate::config::ValidationError;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while preparing a class's content definitions
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("Content '{name}' is declared more than once in {class}")]
    DuplicateContent { class: &'static str, name: String },

    #[error("{0} declares content with an empty name")]
    EmptyName(&'static str),

    #[error("Invalid options for content '{name}' in {class}: {reason}")]
    InvalidOption {
        class: &'static str,
        name: String,
        reason: String,
    },

    #[error("Inheritance cycle in content classes: {0}")]
    InheritanceCycle(String),
}

/// Errors raised while resolving content at runtime
///
/// Every variant raised during resolution names the owning class and the
/// content item so failures can be traced back to a declaration.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error("{class} has no content named '{name}'")]
    UnknownContent { class: &'static str, name: String },

    #[error("Required content '{name}' on {class} matched no elements")]
    RequiredAbsent { class: &'static str, name: String },

    #[error(
        "Content '{name}' on {class} matched {count} element(s), expected {}",
        describe_bounds(.min, .max)
    )]
    CountOutOfBounds {
        class: &'static str,
        name: String,
        count: usize,
        min: usize,
        max: Option<usize>,
    },

    #[error(
        "Timed out after {elapsed:?} waiting for content '{name}' on {class} (last observed: {last_observed})"
    )]
    WaitTimeout {
        class: &'static str,
        name: String,
        elapsed: Duration,
        last_observed: String,
    },

    #[error("Unknown wait preset '{preset}' for content '{name}' on {class}")]
    UnknownWaitPreset {
        class: &'static str,
        name: String,
        preset: String,
    },

    #[error("Query for content '{name}' on {class} failed: {source}")]
    Query {
        class: &'static str,
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Content '{name}' on {class} is {found}, expected {expected}")]
    TypeMismatch {
        class: &'static str,
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Content '{name}' on {class} depends on itself")]
    RecursiveContent { class: &'static str, name: String },

    #[error("{class} has no parameter '{param}'")]
    MissingParam { class: &'static str, param: String },

    #[error("At check failed for {class}")]
    AtCheckFailed { class: &'static str },
}

/// Failure reported by a [`Waiter`](crate::wait::Waiter)
#[derive(Debug, Error)]
pub enum WaitError {
    #[error("Condition not satisfied after {elapsed:?} ({attempts} attempts)")]
    TimedOut { elapsed: Duration, attempts: u32 },

    #[error(transparent)]
    Failed(Box<ContentError>),
}

/// Configuration and logging setup errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Configuration validation failed:\n{}", join_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ConfigurationError {
    fn from(err: config::ConfigError) -> Self {
        ConfigurationError::Load(err.to_string())
    }
}

fn describe_bounds(min: &usize, max: &Option<usize>) -> String {
    match *max {
        Some(max) if max == *min => format!("exactly {}", min),
        Some(max) => format!("between {} and {}", min, max),
        None => format!("at least {}", min),
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}
