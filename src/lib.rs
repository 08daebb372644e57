//! # pressvisor
//!
//! **Pressvisor** turns button presses into timestamped publications.
//!
//! Each press on a monitored input is captured at interrupt level, stamped
//! with the value of a shared logical clock, filtered against contact bounce
//! and published to `<base_topic>/<channel>` with the tick as a decimal payload.
//! A reserved input (or a task fault, or the application) restarts the whole
//! pipeline.
//!
//! ## Architecture
//! ```text
//!  interrupt context            │  tasks (tokio)
//! ──────────────────────────────┼───────────────────────────────────────────────────
//!                               │
//!  InputPins ── EdgeIsr::fire() ─► [edge channel] ──► Dispatcher ──► [publish queue]
//!  (board HAL)   push + wake,   │  (bounded,          │    ▲              │
//!                drop if full   │   drop-on-full)     │    │ snapshot     ▼
//!                               │                     │  TickCounter ◄─ Ticker
//!                               │                     │  (bounded-wait lock)
//!                               │                     │                Publisher ──► Publish (link)
//!                               │                     │ restart input
//!                               │                     ▼
//!                               │             RestartHandle ──► Supervisor
//!                               │                                   │
//!                               │          teardown: deregister inputs, cancel tasks,
//!                               │                    wait up to grace, release queues
//! ```
//!
//! Every component publishes [`Event`]s on the [`Bus`]; the supervisor fans them
//! out to [`Subscribe`] implementations (see [`LogWriter`] for the `tracing` one).
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                              |
//! |-------------------|---------------------------------------------------------------|-------------------------------------------------|
//! | **Supervision**   | One pipeline lifetime: link gate, startup, ordered teardown.  | [`Supervisor`], [`ShutdownReport`]              |
//! | **Inputs**        | Interrupt-safe edge capture over a board-provided HAL.        | [`InputPins`], [`EdgeIsr`], [`EdgeCapture`]     |
//! | **Clock**         | Shared tick counter with bounded lock waits.                  | [`TickCounter`]                                 |
//! | **Publishing**    | Blocking FIFO of records and the link abstraction.            | [`Publish`], [`PublishQueue`], [`PublishRecord`]|
//! | **Restart**       | Single-slot restart signal with a reason.                     | [`RestartHandle`], [`RestartReason`]            |
//! | **Events**        | Observe everything the pipeline does.                         | [`Event`], [`EventKind`], [`Subscribe`]         |
//! | **Errors**        | Typed errors for startup, tasks and collaborators.            | [`RuntimeError`], [`TaskError`], [`PublishError`], [`EdgeError`] |
//! | **Configuration** | Cadence, capacities, topic, inputs, lifecycle timings.       | [`Config`]                                      |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber that renders events via `tracing`.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use pressvisor::{
//!     ChannelId, Config, EdgeError, EdgeIsr, InputPins, LinkState, Publish, PublishError,
//!     RestartReason, Subscribe, Supervisor,
//! };
//!
//! struct Board;
//!
//! impl InputPins for Board {
//!     fn register_edge_source(&self, _ch: ChannelId, _isr: EdgeIsr) -> Result<(), EdgeError> {
//!         Ok(()) // attach `isr.fire()` to the pin's rising-edge interrupt
//!     }
//!     fn deregister_edge_source(&self, _ch: ChannelId) -> Result<(), EdgeError> {
//!         Ok(())
//!     }
//!     fn read_level(&self, _ch: ChannelId) -> bool {
//!         true
//!     }
//! }
//!
//! struct Broker(LinkState);
//!
//! #[async_trait::async_trait]
//! impl Publish for Broker {
//!     async fn publish(&self, topic: &str, payload: bytes::Bytes) -> Result<(), PublishError> {
//!         println!("{topic} <- {payload:?}");
//!         Ok(())
//!     }
//!     fn connected(&self) -> bool {
//!         self.0.is_connected()
//!     }
//!     fn connection_watch(&self) -> Option<tokio::sync::watch::Receiver<bool>> {
//!         Some(self.0.subscribe())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pins = Arc::new(Board);
//!     let link = Arc::new(Broker(LinkState::new()));
//!     link.0.set_connected(true);
//!
//!     let mut cfg = Config::default();
//!     cfg.inputs.push(ChannelId::RESTART);
//!
//!     loop {
//!         #[cfg(feature = "logging")]
//!         let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(pressvisor::LogWriter::new())];
//!         #[cfg(not(feature = "logging"))]
//!         let subs: Vec<Arc<dyn Subscribe>> = Vec::new();
//!
//!         let sup = Supervisor::builder(cfg.clone())
//!             .with_subscribers(subs)
//!             .build(pins.clone(), link.clone());
//!
//!         if sup.run().await?.reason == RestartReason::Signal {
//!             return Ok(());
//!         }
//!     }
//! }
//! ```
mod channel;
mod core;
mod edge;
mod error;
mod events;
mod publish;
mod subscribers;
mod tasks;
mod tick;

#[cfg(test)]
mod testkit;

// ---- Public re-exports ----

pub use channel::ChannelId;
pub use crate::core::{
    Config, RestartHandle, RestartReason, ShutdownReport, Supervisor, SupervisorBuilder,
};
pub use edge::{EdgeCapture, EdgeIsr, EdgeReceiver, InputPins};
pub use error::{EdgeError, LockTimeout, PublishError, QueueClosed, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use publish::{LinkState, Publish, PublishQueue, PublishRecord, RecordReceiver};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{DispatchParams, Dispatcher, Publisher, Task, TaskRef, Ticker};
pub use tick::TickCounter;

// Built-in `tracing` subscriber.
// Enabled by default; opt out with `--no-default-features`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
