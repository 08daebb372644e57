//! Runtime core: configuration, restart signalling and pipeline lifecycle.
//!
//! The public surface is [`Supervisor`] (built through [`SupervisorBuilder`]),
//! its [`Config`], and the restart signal ([`RestartHandle`], [`RestartReason`]).
//!
//! Internal modules:
//! - [`runner`]: runs one task, publishes its lifecycle, turns faults into restarts;
//! - [`supervisor`]: link gate, input registration, task spawning, ordered teardown;
//! - [`alive`]: which tasks are still running (for grace diagnostics);
//! - [`shutdown`]: OS termination signals.

mod alive;
mod builder;
mod config;
mod restart;
mod runner;
mod shutdown;
mod supervisor;

pub use builder::SupervisorBuilder;
pub use config::Config;
pub(crate) use restart::RestartSignal;
pub use restart::{RestartHandle, RestartReason};
pub use supervisor::{ShutdownReport, Supervisor};
