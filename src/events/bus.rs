//! # Pipeline event bus.
//!
//! ```text
//!   Ticker     ──┐
//!   Dispatcher ──┼──► Bus (broadcast, bus_capacity) ──► subscriber_listener ──► AliveTracker
//!   Publisher  ──┤                                                         └──► SubscriberSet
//!   runner     ──┤
//!   Supervisor ──┘
//! ```
//!
//! Publishing never waits, so a task can report a skipped tick or a failed
//! publish from inside its loop without slowing the pipeline. The edge
//! interrupt path never touches the bus; dropped edges are counted atomically
//! and reported later by the dispatcher.
//!
//! The ring buffer is shared by all receivers. A receiver that falls more than
//! `bus_capacity` events behind sees `RecvError::Lagged(n)` and resumes at the
//! oldest retained event. Events sent while nobody is subscribed are gone.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel carrying every [`Event`] of one pipeline lifetime.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus retaining the last `capacity` events (min 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Sends `ev` to every current receiver. Dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New receiver; sees only events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
