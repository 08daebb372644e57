//! # Runs one pipeline task to completion.
//!
//! ```text
//! TaskStarting
//!   task.run(child token)
//!     ├─ Ok / Canceled → TaskStopped
//!     └─ Fail / Fatal  → TaskFailed
//!                        └─► restart.request(Fault) → RestartRequested (first requester only)
//! ```
//!
//! ## Rules
//! - Exactly one terminal event per run
//! - A task is never run twice; a fault tears the whole pipeline down
//! - Cancelling the child token does not affect the parent

use tokio_util::sync::CancellationToken;

use crate::core::{RestartHandle, RestartReason};
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};
use crate::tasks::Task;

/// Runs `task` under a child of `parent`, publishing its lifecycle to `bus`.
pub(crate) async fn run_once<T: Task + ?Sized>(
    task: &T,
    parent: &CancellationToken,
    bus: &Bus,
    restart: &RestartHandle,
) -> Result<(), TaskError> {
    let name = task.name();
    bus.publish(Event::new(EventKind::TaskStarting).with_task(name));

    match task.run(parent.child_token()).await {
        Err(e) if e.is_fault() => {
            bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(name)
                    .with_reason(e.to_string()),
            );
            let reason = RestartReason::Fault {
                task: name.to_string(),
                error: e.to_string(),
            };
            if restart.request(reason.clone()) {
                bus.publish(
                    Event::new(EventKind::RestartRequested)
                        .with_task(name)
                        .with_reason(reason.to_string()),
                );
            }
            Err(e)
        }
        res => {
            bus.publish(Event::new(EventKind::TaskStopped).with_task(name));
            res
        }
    }
}
