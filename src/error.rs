//! Error types used by the pressvisor runtime, its tasks and collaborators.
//!
//! This module defines the error enums that cross module boundaries:
//!
//! - [`RuntimeError`] - errors raised by the supervisor itself (startup gating, shutdown).
//! - [`TaskError`] - errors raised by a pipeline task's run loop.
//! - [`PublishError`] - errors reported by the external publish capability.
//! - [`EdgeError`] - errors reported by the input collaborator (register/deregister).
//!
//! Leaf errors [`LockTimeout`] and [`QueueClosed`] are returned by the tick counter and
//! the publish queue. None of them are propagated past the task that owns the decision;
//! they surface as [`Event`](crate::Event)s instead.

use std::time::Duration;
use thiserror::Error;

use crate::channel::ChannelId;

/// # Errors produced by the pressvisor runtime.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Shutdown grace period was exceeded; some tasks did not stop in time.
    #[error("shutdown timeout {grace:?} exceeded; stuck: {stuck:?}")]
    GraceExceeded {
        /// The configured grace duration.
        grace: Duration,
        /// Names of the tasks still alive when the grace ran out.
        stuck: Vec<String>,
    },

    /// The link reported disconnected and offers no way to wait for a connection.
    #[error("link not connected at startup")]
    NotConnected,

    /// The link did not become connected within the configured window.
    #[error("link not connected within {timeout:?}")]
    ConnectTimeout {
        /// The configured connect timeout.
        timeout: Duration,
    },

    /// An input could not be registered during startup.
    #[error("edge source setup failed: {0}")]
    EdgeSetup(#[from] EdgeError),
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use pressvisor::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::GraceExceeded { grace: Duration::from_secs(5), stuck: vec![] };
    /// assert_eq!(err.as_label(), "runtime_grace_exceeded");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::GraceExceeded { .. } => "runtime_grace_exceeded",
            RuntimeError::NotConnected => "runtime_not_connected",
            RuntimeError::ConnectTimeout { .. } => "runtime_connect_timeout",
            RuntimeError::EdgeSetup(_) => "runtime_edge_setup",
        }
    }
}

/// # Errors produced by a pipeline task.
///
/// A task that returns `Fail` or `Fatal` triggers a fault restart of the pipeline.
/// `Canceled` is a graceful exit.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TaskError {
    /// Non-recoverable error.
    #[error("fatal error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },

    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled due to pipeline shutdown.
    #[error("context cancelled")]
    Canceled,
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fatal { .. } => "task_fatal",
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
        }
    }

    /// Whether this outcome should bring the pipeline down.
    ///
    /// ```
    /// use pressvisor::TaskError;
    ///
    /// assert!(TaskError::Fatal { error: "boom".into() }.is_fault());
    /// assert!(!TaskError::Canceled.is_fault());
    /// ```
    pub fn is_fault(&self) -> bool {
        matches!(self, TaskError::Fail { .. } | TaskError::Fatal { .. })
    }
}

/// # Errors reported by the external publish capability.
///
/// Every variant is terminal for the record being published: it is logged and dropped.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    /// The session is down.
    #[error("not connected")]
    NotConnected,

    /// The client gave up within its own timeout policy.
    #[error("publish timed out")]
    Timeout,

    /// The client or broker refused the message.
    #[error("publish rejected: {reason}")]
    Rejected {
        /// Client-provided detail.
        reason: String,
    },
}

impl PublishError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            PublishError::NotConnected => "publish_not_connected",
            PublishError::Timeout => "publish_timeout",
            PublishError::Rejected { .. } => "publish_rejected",
        }
    }
}

/// # Errors reported by the input collaborator.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EdgeError {
    /// Raw channel index outside the supported range.
    #[error("channel {raw} out of range (max {max})", max = ChannelId::MAX_CHANNELS - 1)]
    InvalidChannel {
        /// The rejected raw value.
        raw: u8,
    },

    /// The hardware layer refused the operation.
    #[error("input {channel}: {reason}")]
    Hal {
        /// Input the operation targeted.
        channel: ChannelId,
        /// Hardware-provided detail.
        reason: String,
    },
}

impl EdgeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EdgeError::InvalidChannel { .. } => "edge_invalid_channel",
            EdgeError::Hal { .. } => "edge_hal",
        }
    }
}

/// The tick counter lock was not obtained within the bounded wait.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("tick counter busy for {waited:?}")]
pub struct LockTimeout {
    /// How long the caller waited.
    pub waited: Duration,
}

/// The publish queue has no consumer any more.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("publish queue closed")]
pub struct QueueClosed;
