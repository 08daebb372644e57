//! # Task abstraction.
//!
//! A pipeline stage is a [`Task`]: a named async loop that receives a
//! [`CancellationToken`] and must return promptly once it is cancelled.
//! The supervisor runs each task exactly once; there is no restart-in-place,
//! a failing task brings the whole pipeline down instead.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Asynchronous, cancelable unit.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use pressvisor::{Task, TaskError};
///
/// struct Idle;
///
/// #[async_trait]
/// impl Task for Idle {
///     fn name(&self) -> &str { "idle" }
///
///     async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError> {
///         ctx.cancelled().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Executes the task until completion or cancellation.
    async fn run(&self, ctx: CancellationToken) -> Result<(), TaskError>;
}

/// Shared handle to a task.
pub type TaskRef = Arc<dyn Task>;
