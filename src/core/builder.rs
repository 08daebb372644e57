use std::sync::Arc;

use super::supervisor::Supervisor;
use crate::{
    core::Config,
    edge::InputPins,
    events::Bus,
    publish::Publish,
    subscribers::{Subscribe, SubscriberSet},
};

/// Builder for a [`Supervisor`].
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers.
    ///
    /// Each subscriber gets a dedicated worker with a bounded queue, so a slow
    /// one never holds up the pipeline.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Wires the supervisor to its two collaborators.
    ///
    /// Must be called inside a Tokio runtime: subscriber workers are spawned here.
    pub fn build(self, pins: Arc<dyn InputPins>, link: Arc<dyn Publish>) -> Supervisor {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        Supervisor::new_internal(self.cfg, bus, subs, pins, link)
    }
}
