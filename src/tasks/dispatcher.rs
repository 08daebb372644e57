//! # Dispatch task: correlates edges with the tick counter.
//!
//! ```text
//! loop {
//!   ├─► edges.recv()                          (unbounded wait, cancellable)
//!   ├─► report edges dropped since last turn   → EdgesDropped
//!   ├─► restart input?  ─► settle, request restart, exit loop
//!   ├─► counter.snapshot(lock_timeout)
//!   │     └─ Err → DispatchLockTimeout, discard edge
//!   ├─► pins.read_level(channel)
//!   │     └─ low → EdgeDebounced, discard edge
//!   └─► queue.submit(record)                  (blocks while full, cancellable)
//!         └─ Err → QueueClosed, idle until cancelled
//! }
//! ```
//!
//! ## Rules
//! - The counter lock covers the snapshot only; nothing downstream runs under it.
//! - Lock contention costs this edge, never the ones queued behind it.
//! - The restart input is handled before the lock so it cannot be lost to contention.
//! - Once an edge passes debounce it is never dropped before the publish queue.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::channel::ChannelId;
use crate::core::{RestartHandle, RestartReason};
use crate::edge::{EdgeReceiver, InputPins};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::publish::{PublishQueue, PublishRecord};
use crate::tasks::Task;
use crate::tick::TickCounter;

/// Dispatcher timing knobs.
#[derive(Clone, Copy, Debug)]
pub struct DispatchParams {
    /// Bounded wait for the tick counter lock.
    pub lock_timeout: Duration,
    /// Delay between the restart input and the restart request.
    pub restart_settle: Duration,
}

/// Consumer of the edge channel, producer of publish records.
pub struct Dispatcher {
    edges: Mutex<EdgeReceiver>,
    counter: Arc<TickCounter>,
    pins: Arc<dyn InputPins>,
    queue: PublishQueue,
    restart: RestartHandle,
    params: DispatchParams,
    bus: Bus,
}

/// What happened to one edge.
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Queued,
    Discarded,
    Restart,
    QueueClosed,
}

impl Dispatcher {
    /// Task name used in events.
    pub const NAME: &'static str = "dispatcher";

    /// Creates a dispatcher.
    pub fn new(
        edges: EdgeReceiver,
        counter: Arc<TickCounter>,
        pins: Arc<dyn InputPins>,
        queue: PublishQueue,
        restart: RestartHandle,
        params: DispatchParams,
        bus: Bus,
    ) -> Self {
        Self {
            edges: Mutex::new(edges),
            counter,
            pins,
            queue,
            restart,
            params,
            bus,
        }
    }

    async fn handle(&self, channel: ChannelId, ctx: &CancellationToken) -> Outcome {
        if channel.is_restart() {
            return self.request_restart(channel, ctx).await;
        }

        let tick = match self.counter.snapshot(self.params.lock_timeout) {
            Ok(tick) => tick,
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::DispatchLockTimeout)
                        .with_task(Self::NAME)
                        .with_channel(channel)
                        .with_reason(e.to_string()),
                );
                return Outcome::Discarded;
            }
        };

        if !self.pins.read_level(channel) {
            self.bus.publish(
                Event::new(EventKind::EdgeDebounced)
                    .with_task(Self::NAME)
                    .with_channel(channel)
                    .with_tick(tick),
            );
            return Outcome::Discarded;
        }

        match self.queue.submit(PublishRecord::new(channel, tick)).await {
            Ok(()) => {
                self.bus.publish(
                    Event::new(EventKind::RecordQueued)
                        .with_task(Self::NAME)
                        .with_channel(channel)
                        .with_tick(tick),
                );
                Outcome::Queued
            }
            Err(e) => {
                self.bus.publish(
                    Event::new(EventKind::QueueClosed)
                        .with_task(Self::NAME)
                        .with_reason(e.to_string()),
                );
                Outcome::QueueClosed
            }
        }
    }

    async fn request_restart(&self, channel: ChannelId, ctx: &CancellationToken) -> Outcome {
        if !self.params.restart_settle.is_zero() {
            tokio::select! {
                _ = ctx.cancelled() => return Outcome::Restart,
                _ = tokio::time::sleep(self.params.restart_settle) => {}
            }
        }
        let reason = RestartReason::Input { channel };
        if self.restart.request(reason.clone()) {
            self.bus.publish(
                Event::new(EventKind::RestartRequested)
                    .with_task(Self::NAME)
                    .with_channel(channel)
                    .with_reason(reason.to_string()),
            );
        }
        Outcome::Restart
    }

    fn report_dropped(&self, edges: &EdgeReceiver) {
        let dropped = edges.take_dropped();
        if dropped > 0 {
            self.bus
                .publish(Event::new(EventKind::EdgesDropped).with_count(dropped));
        }
    }
}

#[async_trait]
impl Task for Dispatcher {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let mut edges = self.edges.lock().await;

        loop {
            let channel = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(()),
                next = edges.recv() => next,
            };
            self.report_dropped(&edges);

            let Some(channel) = channel else {
                return Ok(());
            };

            let outcome = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(()),
                outcome = self.handle(channel, &ctx) => outcome,
            };
            match outcome {
                Outcome::Queued | Outcome::Discarded => {}
                Outcome::Restart => return Ok(()),
                Outcome::QueueClosed => {
                    ctx.cancelled().await;
                    return Ok(());
                }
            }
        }
    }
}
