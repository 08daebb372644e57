//! # Event subscribers.
//!
//! Everything the pipeline does is published as an [`Event`](crate::events::Event)
//! on the [`Bus`](crate::events::Bus). The supervisor forwards each one to a
//! [`SubscriberSet`], which hands it to every [`Subscribe`] implementation
//! through a bounded per-subscriber queue.
//!
//! ```text
//! Ticker / Dispatcher / Publisher / runner / Supervisor
//!         │ publish(Event)
//!         ▼
//!        Bus ──► Supervisor listener ──► SubscriberSet::emit
//!                                            ├──► LogWriter (tracing)
//!                                            └──► application subscribers
//! ```
//!
//! [`LogWriter`] is available with the `logging` feature (on by default).

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
