//! # Pipeline events emitted by the supervisor and the pipeline tasks.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Pipeline events**: what happened to a tick, an edge or a record
//! - **Task lifecycle events**: a pipeline task started, stopped or failed
//! - **Shutdown events**: restart requested, shutdown sequence progress
//! - **Subscriber events**: fan-out overflow or subscriber panic
//!
//! The [`Event`] struct carries additional metadata such as timestamps, task name,
//! channel, tick value and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use pressvisor::{ChannelId, Event, EventKind};
//!
//! let ev = Event::new(EventKind::PublishFailed)
//!     .with_task("publisher")
//!     .with_channel(ChannelId::TEAM0)
//!     .with_tick(42)
//!     .with_reason("not connected");
//!
//! assert_eq!(ev.kind, EventKind::PublishFailed);
//! assert_eq!(ev.channel, Some(ChannelId::TEAM0));
//! assert_eq!(ev.tick, Some(42));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::channel::ChannelId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of pipeline events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Pipeline events ===
    /// Tick source could not take the counter lock; this cycle was skipped.
    ///
    /// Sets: `task`, `reason`
    TickSkipped,

    /// Edges were dropped because the edge channel was full.
    ///
    /// Sets: `count` (edges dropped since the previous report)
    EdgesDropped,

    /// Dispatcher could not take the counter lock; the edge was discarded.
    ///
    /// Sets: `task`, `channel`, `reason`
    DispatchLockTimeout,

    /// Input no longer read active at dispatch time; the edge was discarded.
    ///
    /// Sets: `task`, `channel`, `tick`
    EdgeDebounced,

    /// A record was accepted by the publish queue.
    ///
    /// Sets: `task`, `channel`, `tick`
    RecordQueued,

    /// The external publish capability accepted the record.
    ///
    /// Sets: `task`, `channel`, `tick`, `reason` (topic)
    Published,

    /// The external publish capability returned an error; the record was discarded.
    ///
    /// Sets: `task`, `channel`, `tick`, `reason`
    PublishFailed,

    /// The publish queue became unusable under a running task; the task idles.
    ///
    /// Sets: `task`
    QueueClosed,

    /// An input could not be deregistered during teardown.
    ///
    /// Sets: `channel`, `reason`
    EdgeDeregisterFailed,

    // === Task lifecycle events ===
    /// Task started.
    ///
    /// Sets: `task`
    TaskStarting,

    /// Task returned successfully or was cancelled.
    ///
    /// Sets: `task`
    TaskStopped,

    /// Task returned an error.
    ///
    /// Sets: `task`, `reason`
    TaskFailed,

    // === Shutdown events ===
    /// The restart signal was set.
    ///
    /// Sets: `reason`, `task` (requester, if any), `channel` (restart input, if any)
    RestartRequested,

    /// Supervisor left the running state and started teardown.
    ///
    /// Sets: `reason`
    ShutdownRequested,

    /// All tasks stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some tasks did not stop in time.
    GraceExceeded,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `task` (subscriber name), `reason`
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `task` (subscriber name), `reason`
    SubscriberOverflow,
}

/// Pipeline event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the task (or subscriber) the event concerns.
    pub task: Option<Arc<str>>,
    /// Input the event concerns.
    pub channel: Option<ChannelId>,
    /// Tick value attached to the edge or record.
    pub tick: Option<u64>,
    /// Number of items the event summarises (dropped edges).
    pub count: Option<u64>,
    /// Human-readable reason (errors, topic, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            task: None,
            channel: None,
            tick: None,
            count: None,
            reason: None,
        }
    }

    /// Attaches a task name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an input.
    #[inline]
    pub fn with_channel(mut self, channel: ChannelId) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Attaches a tick value.
    #[inline]
    pub fn with_tick(mut self, tick: u64) -> Self {
        self.tick = Some(tick);
        self
    }

    /// Attaches an item count.
    #[inline]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}
