//! # Liveness of the pipeline tasks.
//!
//! Fed by the supervisor's bus listener; read once, when the shutdown grace
//! runs out, to name the tasks that did not stop.
//!
//! ```text
//! Bus ──► subscriber_listener() ──► AliveTracker::update(&Event)
//!                                        │
//!                                        ▼
//!                          HashMap<task, {last_seq, alive}>
//! ```
//!
//! ## Rules
//! - Only `TaskStarting` / `TaskStopped` / `TaskFailed` change liveness
//! - Any event naming a task advances that task's `last_seq`
//! - Events with `seq <= last_seq` are stale and ignored

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

#[derive(Debug, Clone, Copy)]
struct TaskState {
    last_seq: Option<u64>,
    alive: bool,
}

/// Tracker of which pipeline tasks are currently running.
#[derive(Default)]
pub(crate) struct AliveTracker {
    state: RwLock<HashMap<String, TaskState>>,
}

impl AliveTracker {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Applies `ev` if it is newer than what was seen for its task.
    ///
    /// Returns `true` when the liveness of the task changed.
    pub(crate) async fn update(&self, ev: &Event) -> bool {
        let Some(name) = ev.task.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(TaskState {
            last_seq: None,
            alive: false,
        });
        if entry.last_seq.is_some_and(|last| ev.seq <= last) {
            return false;
        }
        entry.last_seq = Some(ev.seq);

        let alive = match ev.kind {
            EventKind::TaskStarting => true,
            EventKind::TaskStopped | EventKind::TaskFailed => false,
            _ => return false,
        };
        let changed = entry.alive != alive;
        entry.alive = alive;
        changed
    }

    /// Sorted names of the tasks still running.
    pub(crate) async fn snapshot(&self) -> Vec<String> {
        let state = self.state.read().await;
        let mut alive: Vec<String> = state
            .iter()
            .filter(|(_, ts)| ts.alive)
            .map(|(name, _)| name.clone())
            .collect();
        alive.sort_unstable();
        alive
    }
}
