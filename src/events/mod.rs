//! Pipeline events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to everything the pipeline reports: task lifecycle,
//! lock contention, dropped edges, debounced edges, publish outcomes and
//! the shutdown sequence.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Supervisor`, `runner::run_task`, `Ticker`, `Dispatcher`,
//!   `Publisher`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `Supervisor::subscriber_listener()` (fans out to `SubscriberSet`
//!   and updates `AliveTracker`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
