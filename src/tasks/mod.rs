//! # Pipeline tasks.
//!
//! This module provides the task abstraction and the three pipeline stages:
//! - [`Task`] - trait for async cancelable tasks
//! - [`Ticker`] - tick source, sole writer of the tick counter
//! - [`Dispatcher`] - edge consumer, tick reader, debounce, record producer
//! - [`Publisher`] - record consumer, calls the external link

mod dispatcher;
mod publisher;
mod task;
mod ticker;

pub use dispatcher::{DispatchParams, Dispatcher};
pub use publisher::Publisher;
pub use task::{Task, TaskRef};
pub use ticker::Ticker;
