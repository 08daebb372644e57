//! # Interrupt-side producer and task-side consumer of the edge channel.
//!
//! The channel is a fixed-capacity lock-free ring allocated once in
//! [`EdgeCapture::new`]; the consumer parks on an [`AtomicWaker`].
//!
//! ## Rules
//! - **Drop on full**: `EdgeIsr::fire` pushes without blocking or allocating; a
//!   full ring increments an atomic counter and the edge is gone. Nothing retries it.
//! - **Registration gate**: `fire` forwards only while the input's bit is set in
//!   the registration mask, so teardown silences inputs before the HAL handler is
//!   even removed.
//! - **Idempotent registration**: registering twice or deregistering an input that
//!   is not registered succeeds without touching the HAL.
//! - **Close on drop**: once the [`EdgeCapture`] is gone the receiver drains what
//!   is left and then yields `None`.

use std::future::poll_fn;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::task::{Context, Poll};

use crossbeam::queue::ArrayQueue;
use futures::task::AtomicWaker;
use parking_lot::Mutex;

use crate::channel::ChannelId;
use crate::edge::InputPins;
use crate::error::EdgeError;

/// State shared between the interrupt handlers and the capture owner.
struct Shared {
    ring: ArrayQueue<ChannelId>,
    waker: AtomicWaker,
    registered: AtomicU32,
    dropped: AtomicU64,
    closed: AtomicBool,
}

/// Interrupt handler bound to one input.
///
/// Cloning is cheap; the HAL keeps one per registered input.
#[derive(Clone)]
pub struct EdgeIsr {
    channel: ChannelId,
    shared: Arc<Shared>,
}

impl EdgeIsr {
    /// Input this handler reports.
    #[inline]
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Reports one rising edge. Never blocks.
    #[inline]
    pub fn fire(&self) {
        if self.shared.registered.load(Ordering::Acquire) & self.channel.bit() == 0 {
            return;
        }
        match self.shared.ring.push(self.channel) {
            Ok(()) => self.shared.waker.wake(),
            Err(_) => {
                self.shared.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Owner of the edge channel's producer side and of input registration.
pub struct EdgeCapture {
    shared: Arc<Shared>,
    pins: Arc<dyn InputPins>,
    /// Serializes register/deregister (task context only).
    registry: Mutex<()>,
}

impl EdgeCapture {
    /// Creates the edge channel with `capacity` slots (min 1).
    pub fn new(capacity: usize, pins: Arc<dyn InputPins>) -> (Self, EdgeReceiver) {
        let shared = Arc::new(Shared {
            ring: ArrayQueue::new(capacity.max(1)),
            waker: AtomicWaker::new(),
            registered: AtomicU32::new(0),
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        });
        let receiver = EdgeReceiver {
            shared: Arc::clone(&shared),
        };
        let capture = Self {
            shared,
            pins,
            registry: Mutex::new(()),
        };
        (capture, receiver)
    }

    /// Handler for `channel`, as handed to the HAL on registration.
    pub fn isr(&self, channel: ChannelId) -> EdgeIsr {
        EdgeIsr {
            channel,
            shared: Arc::clone(&self.shared),
        }
    }

    /// True if `channel` currently forwards edges.
    pub fn is_registered(&self, channel: ChannelId) -> bool {
        self.shared.registered.load(Ordering::Acquire) & channel.bit() != 0
    }

    /// Starts forwarding edges of `channel`. No-op if already registered.
    pub fn register(&self, channel: ChannelId) -> Result<(), EdgeError> {
        let _guard = self.registry.lock();
        if self.is_registered(channel) {
            return Ok(());
        }
        self.shared
            .registered
            .fetch_or(channel.bit(), Ordering::AcqRel);
        if let Err(e) = self.pins.register_edge_source(channel, self.isr(channel)) {
            self.shared
                .registered
                .fetch_and(!channel.bit(), Ordering::AcqRel);
            return Err(e);
        }
        Ok(())
    }

    /// Stops forwarding edges of `channel`. No-op if not registered.
    ///
    /// The input is silenced even when the HAL reports an error.
    pub fn deregister(&self, channel: ChannelId) -> Result<(), EdgeError> {
        let _guard = self.registry.lock();
        if !self.is_registered(channel) {
            return Ok(());
        }
        self.shared
            .registered
            .fetch_and(!channel.bit(), Ordering::AcqRel);
        self.pins.deregister_edge_source(channel)
    }

    /// Deregisters every registered input, returning the HAL failures.
    pub fn deregister_all(&self) -> Vec<(ChannelId, EdgeError)> {
        let mask = self.shared.registered.load(Ordering::Acquire);
        (0..ChannelId::MAX_CHANNELS)
            .filter(|raw| mask & (1u32 << raw) != 0)
            .filter_map(|raw| ChannelId::new(raw).ok())
            .filter_map(|ch| self.deregister(ch).err().map(|e| (ch, e)))
            .collect()
    }
}

impl Drop for EdgeCapture {
    fn drop(&mut self) {
        self.shared.registered.store(0, Ordering::Release);
        self.shared.closed.store(true, Ordering::Release);
        self.shared.waker.wake();
    }
}

/// Consumer side of the edge channel.
pub struct EdgeReceiver {
    shared: Arc<Shared>,
}

impl EdgeReceiver {
    /// Waits for the next edge. `None` once the [`EdgeCapture`] is dropped
    /// and the ring is drained.
    pub async fn recv(&mut self) -> Option<ChannelId> {
        poll_fn(|cx| self.poll_recv(cx)).await
    }

    fn poll_recv(&self, cx: &mut Context<'_>) -> Poll<Option<ChannelId>> {
        if let Some(channel) = self.shared.ring.pop() {
            return Poll::Ready(Some(channel));
        }
        self.shared.waker.register(cx.waker());
        // An edge may have landed between the first pop and the registration.
        if let Some(channel) = self.shared.ring.pop() {
            return Poll::Ready(Some(channel));
        }
        if self.shared.closed.load(Ordering::Acquire) {
            return Poll::Ready(None);
        }
        Poll::Pending
    }

    /// Returns and resets the number of edges dropped on a full channel.
    pub fn take_dropped(&self) -> u64 {
        self.shared.dropped.swap(0, Ordering::Relaxed)
    }
}
