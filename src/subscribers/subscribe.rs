//! # Subscriber trait.
//!
//! `Subscribe` is how an application observes the pipeline: every [`Event`]
//! published on the bus is handed to each subscriber by a dedicated worker fed
//! from a bounded queue owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - A slow subscriber delays only itself, never the pipeline or other subscribers.
//! - On queue overflow, events for that subscriber are **dropped** and a
//!   `SubscriberOverflow` event is published.
//!
//! ## Example
//! ```
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use pressvisor::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailedPublishes(AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FailedPublishes {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::PublishFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failed-publishes" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles a single event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for overflow and panic reports).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
