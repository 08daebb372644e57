//! # Bounded publish queue.
//!
//! Thin wrapper over [`tokio::sync::mpsc`]. Unlike the edge channel this queue
//! never drops: records that reach it have already passed debounce, so a full
//! queue suspends the submitter until the publisher makes room.

use tokio::sync::mpsc;

use crate::error::QueueClosed;
use crate::publish::PublishRecord;

/// Producer end of the publish queue.
#[derive(Clone, Debug)]
pub struct PublishQueue {
    tx: mpsc::Sender<PublishRecord>,
}

impl PublishQueue {
    /// Creates a queue with `capacity` slots (min 1).
    pub fn new(capacity: usize) -> (Self, RecordReceiver) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, RecordReceiver { rx })
    }

    /// Enqueues `record`, waiting while the queue is full.
    ///
    /// Fails only when the receiver is gone; the record is dropped with the error.
    pub async fn submit(&self, record: PublishRecord) -> Result<(), QueueClosed> {
        self.tx.send(record).await.map_err(|_| QueueClosed)
    }

    /// Free slots right now.
    pub fn available(&self) -> usize {
        self.tx.capacity()
    }
}

/// Consumer end of the publish queue.
#[derive(Debug)]
pub struct RecordReceiver {
    rx: mpsc::Receiver<PublishRecord>,
}

impl RecordReceiver {
    /// Waits for the next record. `None` once every producer is gone and the queue is empty.
    pub async fn recv(&mut self) -> Option<PublishRecord> {
        self.rx.recv().await
    }
}
