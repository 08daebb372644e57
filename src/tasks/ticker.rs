//! # Tick source.
//!
//! Advances the shared [`TickCounter`] once per `tick_interval`.
//!
//! ```text
//! loop {
//!   ├─► try_lock_for(lock_timeout)
//!   │     ├─ Ok  → counter += 1, release
//!   │     └─ Err → publish TickSkipped (this cycle is lost, counter untouched)
//!   └─► wait for next period (cancellable)
//! }
//! ```
//!
//! A missed tick is acceptable, a corrupted counter is not: a failed cycle is
//! never retried synchronously.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::Task;
use crate::tick::TickCounter;

/// Periodic writer of the tick counter.
pub struct Ticker {
    counter: Arc<TickCounter>,
    interval: Duration,
    lock_timeout: Duration,
    bus: Bus,
}

impl Ticker {
    /// Task name used in events.
    pub const NAME: &'static str = "ticker";

    /// Creates a tick source for `counter`.
    pub fn new(
        counter: Arc<TickCounter>,
        interval: Duration,
        lock_timeout: Duration,
        bus: Bus,
    ) -> Self {
        Self {
            counter,
            interval,
            lock_timeout,
            bus,
        }
    }

    fn step(&self) {
        if let Err(e) = self.counter.advance(self.lock_timeout) {
            self.bus.publish(
                Event::new(EventKind::TickSkipped)
                    .with_task(Self::NAME)
                    .with_reason(e.to_string()),
            );
        }
    }
}

#[async_trait]
impl Task for Ticker {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
        let mut period = time::interval(self.interval.max(Duration::from_millis(1)));
        period.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Ok(()),
                _ = period.tick() => self.step(),
            }
        }
    }
}
