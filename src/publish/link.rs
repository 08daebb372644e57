//! # Network link contract.
//!
//! [`Publish`] is the only capability the pipeline needs from the network session
//! (Wi-Fi association, broker connection and reconnection all live behind it).
//!
//! Connection state is consulted only at startup. Instead of polling
//! `connected()` in a sleep loop, the supervisor waits on the
//! [`watch`](tokio::sync::watch) receiver returned by [`Publish::connection_watch`],
//! which the collaborator flips on every state transition (see [`LinkState`]).

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::watch;

use crate::error::PublishError;

/// External publish capability.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use bytes::Bytes;
/// use pressvisor::{LinkState, Publish, PublishError};
///
/// struct Stdout {
///     state: LinkState,
/// }
///
/// #[async_trait]
/// impl Publish for Stdout {
///     async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
///         println!("{topic} {}", String::from_utf8_lossy(&payload));
///         Ok(())
///     }
///     fn connected(&self) -> bool {
///         self.state.is_connected()
///     }
///     fn connection_watch(&self) -> Option<tokio::sync::watch::Receiver<bool>> {
///         Some(self.state.subscribe())
///     }
/// }
/// ```
#[async_trait]
pub trait Publish: Send + Sync + 'static {
    /// Sends `payload` to `topic` with at-least-once delivery requested.
    ///
    /// May suspend for as long as the client's own timeout policy allows.
    /// Any error is terminal for this payload; the pipeline never retries.
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError>;

    /// Non-blocking connection query.
    fn connected(&self) -> bool;

    /// Receiver that observes connection transitions, if the link offers one.
    fn connection_watch(&self) -> Option<watch::Receiver<bool>> {
        None
    }
}

/// Connection flag with change notification.
///
/// The session layer calls [`set_connected`](LinkState::set_connected) from its
/// event handler; waiters are woken exactly on transitions.
#[derive(Debug)]
pub struct LinkState {
    tx: watch::Sender<bool>,
}

impl LinkState {
    /// Creates a disconnected link state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Records a transition. Repeating the current state wakes nobody.
    pub fn set_connected(&self, connected: bool) {
        self.tx.send_if_modified(|state| {
            let changed = *state != connected;
            *state = connected;
            changed
        });
    }

    /// Current state.
    pub fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    /// New receiver observing subsequent transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}
