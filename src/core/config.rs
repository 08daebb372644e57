//! # Pipeline configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor and the pipeline tasks.
//!
//! ## Sentinel values
//! - `connect_timeout = 0s` → wait for the link forever
//! - `grace = 0s` → tasks still running at teardown are aborted at once
//! - capacities of `0` are clamped to `1`

use std::time::Duration;

use crate::channel::ChannelId;

/// Global configuration for the pipeline.
///
/// Defines:
/// - **Tick source**: cadence and lock acquisition bound
/// - **Queues**: edge channel and publish queue capacities
/// - **Wire contract**: base topic
/// - **Inputs**: which channels are registered at startup
/// - **Lifecycle**: restart settle delay, shutdown grace, startup connect window
/// - **Event system**: bus capacity for event delivery
///
/// All fields are public. Prefer the helper accessors to avoid sprinkling
/// sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Period of the tick source (one logical time-unit step per period).
    pub tick_interval: Duration,

    /// Bounded wait for the tick counter lock (one scheduler tick).
    ///
    /// Both the tick source and the dispatcher abandon their operation when
    /// the lock is not obtained within this window.
    pub lock_timeout: Duration,

    /// Slots in the interrupt-fed edge channel. Edges beyond it are dropped.
    pub edge_capacity: usize,

    /// Slots in the publish queue. A full queue blocks the dispatcher.
    pub publish_capacity: usize,

    /// Topic prefix; records go to `<base_topic>/<channel index>`.
    pub base_topic: String,

    /// Inputs registered at startup (add [`ChannelId::RESTART`] to wire a restart button).
    pub inputs: Vec<ChannelId>,

    /// Delay between seeing the restart input and raising the restart signal.
    pub restart_settle: Duration,

    /// Maximum time to wait for tasks to stop at teardown.
    pub grace: Duration,

    /// Maximum time to wait for the link to come up before starting.
    pub connect_timeout: Duration,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,
}

impl Config {
    /// Edge channel capacity clamped to a minimum of 1.
    #[inline]
    pub fn edge_capacity_clamped(&self) -> usize {
        self.edge_capacity.max(1)
    }

    /// Publish queue capacity clamped to a minimum of 1.
    #[inline]
    pub fn publish_capacity_clamped(&self) -> usize {
        self.publish_capacity.max(1)
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Startup connect window as an `Option`.
    ///
    /// - `None` → wait forever
    /// - `Some(d)` → fail startup after `d`
    #[inline]
    pub fn connect_limit(&self) -> Option<Duration> {
        if self.connect_timeout == Duration::ZERO {
            None
        } else {
            Some(self.connect_timeout)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `tick_interval = 10ms`, `lock_timeout = 1ms`
    /// - `edge_capacity = 32`, `publish_capacity = 32`
    /// - `base_topic = "button/pressed"`, `inputs = [TEAM0, TEAM1]`
    /// - `restart_settle = 100ms`, `grace = 5s`, `connect_timeout = 0s` (forever)
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(10),
            lock_timeout: Duration::from_millis(1),
            edge_capacity: 32,
            publish_capacity: 32,
            base_topic: "button/pressed".to_string(),
            inputs: vec![ChannelId::TEAM0, ChannelId::TEAM1],
            restart_settle: Duration::from_millis(100),
            grace: Duration::from_secs(5),
            connect_timeout: Duration::ZERO,
            bus_capacity: 1024,
        }
    }
}
