//! # Fan-out of bus events to subscribers.
//!
//! ```text
//! emit(&Event)
//!     ├──► [queue 1] ──► worker 1 ──► sub1.on_event()
//!     │                     └──────► panic → SubscriberPanicked
//!     └──► [queue N] ──► worker N ──► subN.on_event()
//! ```
//!
//! ## Rules
//! - `emit` never waits: full queue → event dropped for that subscriber, `SubscriberOverflow`
//! - Per-subscriber FIFO, no ordering across subscribers
//! - A panicking subscriber is reported and keeps receiving events
//!
//! `AssertUnwindSafe` is used around `on_event`: a subscriber that panics while
//! holding its own lock may leave that state poisoned or inconsistent.

use std::any::Any;
use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Bus, Event, EventKind};
use crate::subscribers::Subscribe;

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Per-subscriber queues and workers.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    workers: Vec<JoinHandle<()>>,
    bus: Bus,
}

impl SubscriberSet {
    /// Spawns one worker per subscriber. Queue capacity is at least 1.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let mut lanes = Vec::with_capacity(subs.len());
        let mut workers = Vec::with_capacity(subs.len());

        for sub in subs {
            let name = sub.name();
            let (tx, rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));
            workers.push(tokio::spawn(drive(sub, rx, bus.clone())));
            lanes.push(Lane { name, tx });
        }
        Self {
            lanes,
            workers,
            bus,
        }
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Queues `event` for every subscriber without waiting.
    pub fn emit(&self, event: &Event) {
        if self.is_empty() {
            return;
        }
        let event = Arc::new(event.clone());
        let report = event.kind != EventKind::SubscriberOverflow;

        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&event)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            if report {
                self.bus
                    .publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    /// Closes every queue and waits for the workers to drain them.
    pub async fn shutdown(self) {
        drop(self.lanes);
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

async fn drive(sub: Arc<dyn Subscribe>, mut rx: mpsc::Receiver<Arc<Event>>, bus: Bus) {
    while let Some(ev) = rx.recv().await {
        let handled = std::panic::AssertUnwindSafe(sub.on_event(&ev))
            .catch_unwind()
            .await;
        if let Err(panic) = handled {
            bus.publish(Event::subscriber_panicked(sub.name(), panic_message(&*panic)));
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use tokio::sync::Semaphore;

    use super::*;

    #[derive(Default)]
    struct Collect(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            if ev.kind == EventKind::TickSkipped {
                panic!("scripted panic");
            }
            self.0.lock().push(ev.kind);
        }

        fn name(&self) -> &'static str {
            "collect"
        }
    }

    /// Blocks on every event until the test hands out a permit.
    struct Gate(Semaphore);

    #[async_trait]
    impl Subscribe for Gate {
        async fn on_event(&self, _ev: &Event) {
            if let Ok(permit) = self.0.acquire().await {
                permit.forget();
            }
        }

        fn name(&self) -> &'static str {
            "gate"
        }

        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn delivers_in_order_and_survives_panics() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let collect = Arc::new(Collect::default());
        let set = SubscriberSet::new(vec![collect.clone()], bus.clone());

        set.emit(&Event::new(EventKind::Published));
        set.emit(&Event::new(EventKind::TickSkipped));
        set.emit(&Event::new(EventKind::PublishFailed));
        set.shutdown().await;

        assert_eq!(
            *collect.0.lock(),
            vec![EventKind::Published, EventKind::PublishFailed]
        );
        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.task.as_deref(), Some("collect"));
        assert_eq!(ev.reason.as_deref(), Some("scripted panic"));
    }

    #[tokio::test]
    async fn full_queue_drops_and_reports() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let gate = Arc::new(Gate(Semaphore::new(0)));
        let set = SubscriberSet::new(vec![gate.clone()], bus.clone());

        // First event is taken by the worker, second fills the queue.
        set.emit(&Event::new(EventKind::Published));
        tokio::time::sleep(Duration::from_millis(10)).await;
        set.emit(&Event::new(EventKind::Published));
        set.emit(&Event::new(EventKind::Published));

        let ev = events.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.task.as_deref(), Some("gate"));

        gate.0.add_permits(2);
        set.shutdown().await;
    }

    #[tokio::test]
    async fn overflow_events_are_not_reported_again() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let gate = Arc::new(Gate(Semaphore::new(0)));
        let set = SubscriberSet::new(vec![gate.clone()], bus.clone());

        set.emit(&Event::new(EventKind::Published));
        tokio::time::sleep(Duration::from_millis(10)).await;
        set.emit(&Event::new(EventKind::Published));
        set.emit(&Event::subscriber_overflow("other", "full"));

        assert!(events.try_recv().is_err());
        gate.0.add_permits(2);
        set.shutdown().await;
    }
}
