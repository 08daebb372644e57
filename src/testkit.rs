//! Scripted collaborators shared by the unit tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::{Notify, broadcast, watch};

use crate::channel::ChannelId;
use crate::edge::{EdgeIsr, InputPins};
use crate::error::{EdgeError, PublishError};
use crate::events::{Event, EventKind};
use crate::publish::{LinkState, Publish};

/// Input bank whose levels and HAL failures are set by the test.
#[derive(Default)]
pub(crate) struct ScriptedPins {
    isrs: Mutex<HashMap<ChannelId, EdgeIsr>>,
    levels: Mutex<HashMap<ChannelId, bool>>,
    failing_register: Mutex<HashSet<ChannelId>>,
    failing_deregister: Mutex<HashSet<ChannelId>>,
    registers: AtomicUsize,
    deregisters: AtomicUsize,
}

impl ScriptedPins {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_level(&self, channel: ChannelId, high: bool) {
        self.levels.lock().insert(channel, high);
    }

    /// Rising edge that stays high: passes debounce.
    pub(crate) fn press(&self, channel: ChannelId) {
        self.set_level(channel, true);
        self.fire(channel);
    }

    /// Rising edge that has already fallen by dispatch time.
    pub(crate) fn bounce(&self, channel: ChannelId) {
        self.set_level(channel, false);
        self.fire(channel);
    }

    fn fire(&self, channel: ChannelId) {
        let isr = self.isrs.lock().get(&channel).cloned();
        if let Some(isr) = isr {
            isr.fire();
        }
    }

    pub(crate) fn fail_register(&self, channel: ChannelId) {
        self.failing_register.lock().insert(channel);
    }

    pub(crate) fn fail_deregister(&self, channel: ChannelId) {
        self.failing_deregister.lock().insert(channel);
    }

    pub(crate) fn register_calls(&self) -> usize {
        self.registers.load(Ordering::SeqCst)
    }

    pub(crate) fn deregister_calls(&self) -> usize {
        self.deregisters.load(Ordering::SeqCst)
    }

    pub(crate) fn is_installed(&self, channel: ChannelId) -> bool {
        self.isrs.lock().contains_key(&channel)
    }
}

impl InputPins for ScriptedPins {
    fn register_edge_source(&self, channel: ChannelId, isr: EdgeIsr) -> Result<(), EdgeError> {
        assert_eq!(isr.channel(), channel);
        self.registers.fetch_add(1, Ordering::SeqCst);
        if self.failing_register.lock().contains(&channel) {
            return Err(EdgeError::Hal {
                channel,
                reason: "scripted register failure".into(),
            });
        }
        self.isrs.lock().insert(channel, isr);
        Ok(())
    }

    fn deregister_edge_source(&self, channel: ChannelId) -> Result<(), EdgeError> {
        self.deregisters.fetch_add(1, Ordering::SeqCst);
        if self.failing_deregister.lock().contains(&channel) {
            return Err(EdgeError::Hal {
                channel,
                reason: "scripted deregister failure".into(),
            });
        }
        self.isrs.lock().remove(&channel);
        Ok(())
    }

    fn read_level(&self, channel: ChannelId) -> bool {
        self.levels.lock().get(&channel).copied().unwrap_or(false)
    }
}

/// Link that records every publish call and answers from a script.
pub(crate) struct RecordingLink {
    pub(crate) state: LinkState,
    sent: Mutex<Vec<(String, Bytes)>>,
    script: Mutex<VecDeque<Result<(), PublishError>>>,
    offer_watch: bool,
    published: Notify,
}

impl RecordingLink {
    /// Connected link offering a connection watch.
    pub(crate) fn connected() -> Self {
        let link = Self::disconnected(true);
        link.state.set_connected(true);
        link
    }

    /// Disconnected link; `offer_watch` controls `connection_watch()`.
    pub(crate) fn disconnected(offer_watch: bool) -> Self {
        Self {
            state: LinkState::new(),
            sent: Mutex::new(Vec::new()),
            script: Mutex::new(VecDeque::new()),
            offer_watch,
            published: Notify::new(),
        }
    }

    /// Queues the answer for a future publish call (default answer is `Ok`).
    pub(crate) fn answer_next(&self, answer: Result<(), PublishError>) {
        self.script.lock().push_back(answer);
    }

    pub(crate) fn sent(&self) -> Vec<(String, Bytes)> {
        self.sent.lock().clone()
    }

    /// Waits until at least `n` publish calls were made.
    pub(crate) async fn wait_for_calls(&self, n: usize) -> Vec<(String, Bytes)> {
        loop {
            let notified = self.published.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            let sent = self.sent();
            if sent.len() >= n {
                return sent;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Publish for RecordingLink {
    async fn publish(&self, topic: &str, payload: Bytes) -> Result<(), PublishError> {
        self.sent.lock().push((topic.to_string(), payload));
        let answer = self.script.lock().pop_front().unwrap_or(Ok(()));
        self.published.notify_waiters();
        answer
    }

    fn connected(&self) -> bool {
        self.state.is_connected()
    }

    fn connection_watch(&self) -> Option<watch::Receiver<bool>> {
        self.offer_watch.then(|| self.state.subscribe())
    }
}

/// Drains every event currently buffered in `rx`.
pub(crate) fn drain_kinds(rx: &mut broadcast::Receiver<Event>) -> Vec<EventKind> {
    std::iter::from_fn(|| rx.try_recv().ok())
        .map(|ev| ev.kind)
        .collect()
}
