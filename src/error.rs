//! Error types used by the servekit runtime, its components and the worker pool.
//!
//! This module defines:
//!
//! - [`RuntimeError`] - errors surfaced by [`App::run`](crate::App::run).
//! - [`ComponentError`] - errors returned by component `start`/`stop` bodies.
//! - [`PoolError`] - construction and submission errors of the [`Pool`](crate::Pool).
//! - [`Fault`] - a caught panic, delivered instead of unwinding across a boundary.
//!
//! All enums provide `as_label` (stable snake_case for logs/metrics) and `as_message`.

use std::fmt;

use thiserror::Error;

/// A panic caught at an execution boundary (pool worker, component body, subscriber).
///
/// The original payload is reduced to its message; non-string payloads become `"unknown panic"`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("panicked: {message}")]
pub struct Fault {
    message: String,
}

impl Fault {
    /// Creates a fault carrying the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Which half of a component's lifecycle produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Stop,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Start => f.write_str("start"),
            Phase::Stop => f.write_str("stop"),
        }
    }
}

/// # Errors produced by the orchestration runtime.
///
/// [`App::run`](crate::App::run) returns at most one of these: the first real error
/// observed among all component starters and stoppers. Plain cancellation is never
/// reported here.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `run` was called on an app that already left the `Created` state.
    #[error("app already started")]
    AlreadyStarted,

    /// A component's `start` returned an error.
    #[error("component '{component}' failed to start: {source}")]
    ComponentStart {
        /// Component name.
        component: String,
        /// Error returned by the component.
        source: ComponentError,
    },

    /// A component's `stop` returned an error.
    #[error("component '{component}' failed to stop: {source}")]
    ComponentStop {
        /// Component name.
        component: String,
        /// Error returned by the component.
        source: ComponentError,
    },

    /// A component's `start` or `stop` panicked.
    #[error("component '{component}' {phase} {fault}")]
    ComponentPanicked {
        /// Component name.
        component: String,
        /// Lifecycle half that panicked.
        phase: Phase,
        /// The caught panic.
        fault: Fault,
    },

    /// A component's start or stop task was torn down by the runtime before finishing.
    #[error("component '{component}' {phase} task aborted")]
    ComponentAborted {
        /// Component name.
        component: String,
        /// Lifecycle half whose task was aborted.
        phase: Phase,
    },

    /// The termination source could not be installed.
    #[error("failed to install termination source: {error}")]
    SignalInstall {
        /// The underlying error message.
        error: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servekit::RuntimeError;
    ///
    /// let err = RuntimeError::AlreadyStarted;
    /// assert_eq!(err.as_label(), "runtime_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::AlreadyStarted => "runtime_already_started",
            RuntimeError::ComponentStart { .. } => "runtime_component_start",
            RuntimeError::ComponentStop { .. } => "runtime_component_stop",
            RuntimeError::ComponentPanicked { .. } => "runtime_component_panicked",
            RuntimeError::ComponentAborted { .. } => "runtime_component_aborted",
            RuntimeError::SignalInstall { .. } => "runtime_signal_install",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::AlreadyStarted => "app already started".to_string(),
            RuntimeError::ComponentStart { component, source } => {
                format!("start failed: component={component} error={}", source.as_message())
            }
            RuntimeError::ComponentStop { component, source } => {
                format!("stop failed: component={component} error={}", source.as_message())
            }
            RuntimeError::ComponentPanicked {
                component,
                phase,
                fault,
            } => format!(
                "panic: component={component} phase={phase} info={}",
                fault.message()
            ),
            RuntimeError::ComponentAborted { component, phase } => {
                format!("aborted: component={component} phase={phase}")
            }
            RuntimeError::SignalInstall { error } => format!("signal install: {error}"),
        }
    }

    /// Returns the component this error is attributed to, if any.
    pub fn component(&self) -> Option<&str> {
        match self {
            RuntimeError::ComponentStart { component, .. }
            | RuntimeError::ComponentStop { component, .. }
            | RuntimeError::ComponentPanicked { component, .. }
            | RuntimeError::ComponentAborted { component, .. } => Some(component),
            RuntimeError::AlreadyStarted | RuntimeError::SignalInstall { .. } => None,
        }
    }
}

/// # Errors produced by component bodies.
///
/// `Canceled` is the clean-shutdown outcome: the runtime filters it out instead of
/// reporting it from [`App::run`](crate::App::run).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// The component unwound because its context was cancelled.
    #[error("context cancelled")]
    Canceled,

    /// The component failed.
    #[error("{error}")]
    Failed {
        /// The underlying error message.
        error: String,
    },
}

impl ComponentError {
    /// Builds a [`ComponentError::Failed`] from anything displayable.
    ///
    /// # Example
    /// ```
    /// use servekit::ComponentError;
    ///
    /// let err = ComponentError::failed("bind: address in use");
    /// assert_eq!(err.to_string(), "bind: address in use");
    /// ```
    pub fn failed(error: impl fmt::Display) -> Self {
        ComponentError::Failed {
            error: error.to_string(),
        }
    }

    /// Returns `true` for the clean-shutdown outcome.
    pub fn is_canceled(&self) -> bool {
        matches!(self, ComponentError::Canceled)
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ComponentError::Canceled => "component_canceled",
            ComponentError::Failed { .. } => "component_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            ComponentError::Canceled => "context cancelled".to_string(),
            ComponentError::Failed { error } => format!("error: {error}"),
        }
    }
}

impl From<std::io::Error> for ComponentError {
    fn from(err: std::io::Error) -> Self {
        ComponentError::failed(err)
    }
}

/// # Errors produced by the worker pool.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    /// Pool capacity must be greater than zero.
    #[error("invalid pool capacity")]
    InvalidCapacity,

    /// The pool was closed; the task was rejected.
    #[error("pool already closed")]
    Closed,

    /// The queue has no free slot (only from [`Pool::try_submit`](crate::Pool::try_submit)).
    #[error("pool queue full")]
    Full,
}

impl PoolError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use servekit::PoolError;
    ///
    /// assert_eq!(PoolError::Closed.as_label(), "pool_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            PoolError::InvalidCapacity => "pool_invalid_capacity",
            PoolError::Closed => "pool_closed",
            PoolError::Full => "pool_full",
        }
    }

    /// Indicates whether submitting the same task later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PoolError::Full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_error_display_and_labels() {
        let err = ComponentError::failed("boom");
        assert_eq!(err.to_string(), "boom");
        assert_eq!(err.as_label(), "component_failed");
        assert!(!err.is_canceled());
        assert!(ComponentError::Canceled.is_canceled());
    }

    #[test]
    fn test_runtime_error_carries_component() {
        let err = RuntimeError::ComponentStart {
            component: "http".into(),
            source: ComponentError::failed("bind"),
        };
        assert_eq!(err.component(), Some("http"));
        assert_eq!(err.as_label(), "runtime_component_start");
        assert_eq!(err.to_string(), "component 'http' failed to start: bind");
        assert_eq!(RuntimeError::AlreadyStarted.component(), None);
    }

    #[test]
    fn test_panicked_message_mentions_phase() {
        let err = RuntimeError::ComponentPanicked {
            component: "grpc".into(),
            phase: Phase::Stop,
            fault: Fault::new("oops"),
        };
        assert_eq!(err.to_string(), "component 'grpc' stop panicked: oops");
        assert!(err.as_message().contains("phase=stop"));
    }

    #[test]
    fn test_pool_error_retryable() {
        assert!(PoolError::Full.is_retryable());
        assert!(!PoolError::Closed.is_retryable());
        assert!(!PoolError::InvalidCapacity.is_retryable());
    }
}
