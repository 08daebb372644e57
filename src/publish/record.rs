//! # Publish record and its wire rendering.
//!
//! The one on-the-wire contract the pipeline owns:
//! - topic   = `<base_topic>/<channel index>`
//! - payload = decimal ASCII of the tick value, no trailing delimiter

use bytes::Bytes;

use crate::channel::ChannelId;

/// One debounced press, stamped with the tick observed at dispatch.
///
/// Not `Clone`: the record moves from the dispatcher into the queue and from the
/// queue into the publisher, which drops it after a single publish attempt.
#[derive(Debug, PartialEq, Eq)]
pub struct PublishRecord {
    channel: ChannelId,
    tick: u64,
}

impl PublishRecord {
    /// Creates a record.
    pub fn new(channel: ChannelId, tick: u64) -> Self {
        Self { channel, tick }
    }

    /// Input that was pressed.
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Tick value captured at dispatch.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Topic this record is published to.
    ///
    /// ```
    /// use pressvisor::{ChannelId, PublishRecord};
    ///
    /// let rec = PublishRecord::new(ChannelId::TEAM1, 7);
    /// assert_eq!(rec.topic("button/pressed"), "button/pressed/1");
    /// assert_eq!(&rec.payload()[..], b"7");
    /// ```
    pub fn topic(&self, base: &str) -> String {
        format!("{base}/{}", self.channel.topic_suffix())
    }

    /// Payload: the tick rendered in decimal ASCII.
    pub fn payload(&self) -> Bytes {
        Bytes::from(self.tick.to_string())
    }
}
