//! # LogWriter: pipeline events as `tracing` records.
//!
//! | Events                                                      | Level   |
//! |-------------------------------------------------------------|---------|
//! | `RecordQueued`, `Published`, `EdgeDebounced`                | `debug` |
//! | task lifecycle, `RestartRequested`, shutdown progress       | `info`  |
//! | `TickSkipped`, `DispatchLockTimeout`, `EdgesDropped`, deregistration, subscriber overflow | `warn` |
//! | `PublishFailed`, `QueueClosed`, `TaskFailed`, `GraceExceeded`, subscriber panic | `error` |
//!
//! Install any `tracing` subscriber (e.g. `tracing_subscriber::fmt`) to see them.

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Subscriber that forwards every event to `tracing`.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Creates a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        let channel = e.channel.map(|c| c.to_string()).unwrap_or_default();

        match e.kind {
            EventKind::RecordQueued => debug!(seq = e.seq, %channel, tick = e.tick, "record queued"),
            EventKind::Published => debug!(seq = e.seq, %channel, tick = e.tick, topic = reason, "published"),
            EventKind::EdgeDebounced => debug!(seq = e.seq, %channel, tick = e.tick, "edge debounced"),

            EventKind::TaskStarting => info!(seq = e.seq, task, "task starting"),
            EventKind::TaskStopped => info!(seq = e.seq, task, "task stopped"),
            EventKind::RestartRequested => info!(seq = e.seq, task, %channel, reason, "restart requested"),
            EventKind::ShutdownRequested => info!(seq = e.seq, reason, "shutdown requested"),
            EventKind::AllStoppedWithin => info!(seq = e.seq, "all tasks stopped within grace"),

            EventKind::TickSkipped => warn!(seq = e.seq, task, reason, "tick skipped"),
            EventKind::DispatchLockTimeout => warn!(seq = e.seq, %channel, reason, "edge discarded: tick counter busy"),
            EventKind::EdgesDropped => warn!(seq = e.seq, dropped = e.count, "edge channel full, edges dropped"),
            EventKind::EdgeDeregisterFailed => warn!(seq = e.seq, %channel, reason, "input deregistration failed"),
            EventKind::SubscriberOverflow => warn!(seq = e.seq, subscriber = task, reason, "subscriber dropped event"),

            EventKind::PublishFailed => error!(seq = e.seq, %channel, tick = e.tick, reason, "publish failed"),
            EventKind::QueueClosed => error!(seq = e.seq, task, reason, "queue closed, task idle"),
            EventKind::TaskFailed => error!(seq = e.seq, task, reason, "task failed"),
            EventKind::GraceExceeded => error!(seq = e.seq, "grace exceeded"),
            EventKind::SubscriberPanicked => error!(seq = e.seq, subscriber = task, reason, "subscriber panicked"),
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
