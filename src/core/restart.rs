//! # Single-slot restart signal.
//!
//! The pipeline has exactly one cross-cutting signal: "tear everything down".
//! The first request latches it and every later request is ignored, even after
//! the supervisor has taken the reason out of the slot, so the supervisor
//! observes exactly one reason per lifetime.
//!
//! ```text
//! Dispatcher (restart input) ──┐
//! runner (task fault)        ──┼──► RestartHandle::request() ──► [slot] ──► Supervisor
//! application               ──┘
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;

use crate::channel::ChannelId;

/// Why the pipeline is shutting down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestartReason {
    /// The reserved restart input fired.
    Input {
        /// Input that carried the request.
        channel: ChannelId,
    },
    /// A pipeline task failed.
    Fault {
        /// Failing task.
        task: String,
        /// Error it returned.
        error: String,
    },
    /// The process received a termination signal.
    Signal,
    /// The embedding application asked for it.
    External,
}

impl RestartReason {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            RestartReason::Input { .. } => "restart_input",
            RestartReason::Fault { .. } => "restart_fault",
            RestartReason::Signal => "restart_signal",
            RestartReason::External => "restart_external",
        }
    }
}

impl fmt::Display for RestartReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RestartReason::Input { channel } => write!(f, "restart input {channel}"),
            RestartReason::Fault { task, error } => write!(f, "task {task} failed: {error}"),
            RestartReason::Signal => f.write_str("termination signal"),
            RestartReason::External => f.write_str("requested by application"),
        }
    }
}

/// Setter side of the restart signal. Cheap to clone.
#[derive(Clone, Debug)]
pub struct RestartHandle {
    tx: mpsc::Sender<RestartReason>,
    latched: Arc<AtomicBool>,
}

impl RestartHandle {
    /// Sets the signal. Returns `false` if it was already set (or nobody listens).
    pub fn request(&self, reason: RestartReason) -> bool {
        if self.latched.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.tx.try_send(reason).is_ok()
    }

    /// Whether a request has already been accepted.
    pub fn is_set(&self) -> bool {
        self.latched.load(Ordering::Acquire)
    }
}

/// Waiting side of the restart signal.
#[derive(Debug)]
pub(crate) struct RestartSignal {
    rx: mpsc::Receiver<RestartReason>,
}

impl RestartSignal {
    pub(crate) fn new() -> (RestartHandle, RestartSignal) {
        let (tx, rx) = mpsc::channel(1);
        let latched = Arc::new(AtomicBool::new(false));
        (RestartHandle { tx, latched }, RestartSignal { rx })
    }

    /// Waits until the signal is set. `None` if every handle was dropped first.
    pub(crate) async fn wait(&mut self) -> Option<RestartReason> {
        self.rx.recv().await
    }
}
