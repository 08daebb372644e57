//! # Publish side: records, the bounded queue and the link contract.
//!
//! ```text
//! Dispatcher ── submit(PublishRecord) ──► [publish queue, 32] ──► Publisher ──► Publish::publish()
//!               (blocks while full)                                (owns the record, drops it
//!                                                                    after one attempt)
//! ```
//!
//! - [`PublishRecord`] is a move-only value: whoever holds it owns it.
//! - [`PublishQueue`] / [`RecordReceiver`] are the two ends of the queue.
//! - [`Publish`] is the network collaborator; [`LinkState`] is a helper that
//!   collaborators embed to notify connection transitions.

mod link;
mod queue;
mod record;

pub use link::{LinkState, Publish};
pub use queue::{PublishQueue, RecordReceiver};
pub use record::PublishRecord;
