//! # Channel identifiers.
//!
//! A [`ChannelId`] names one monitored input. Ids are small (`0..32`) so the set of
//! registered inputs fits a single atomic bitmask that interrupt context can read
//! without locking.
//!
//! ```text
//! TEAM0 = 0  ──► topic suffix "0"
//! TEAM1 = 1  ──► topic suffix "1"
//! ...
//! RESTART = 31 ─► never published; requests a pipeline restart
//! ```

use std::fmt;

use crate::error::EdgeError;

/// Identifier of a monitored input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(u8);

impl ChannelId {
    /// Number of distinct ids (the width of the registration bitmask).
    pub const MAX_CHANNELS: u8 = 32;

    /// First team button.
    pub const TEAM0: ChannelId = ChannelId(0);
    /// Second team button.
    pub const TEAM1: ChannelId = ChannelId(1);
    /// Reserved id: an edge on it means "restart requested".
    pub const RESTART: ChannelId = ChannelId(Self::MAX_CHANNELS - 1);

    /// Validates a raw index.
    ///
    /// ```
    /// use pressvisor::ChannelId;
    ///
    /// assert_eq!(ChannelId::new(1).unwrap(), ChannelId::TEAM1);
    /// assert!(ChannelId::new(32).is_err());
    /// ```
    pub fn new(raw: u8) -> Result<Self, EdgeError> {
        if raw < Self::MAX_CHANNELS {
            Ok(ChannelId(raw))
        } else {
            Err(EdgeError::InvalidChannel { raw })
        }
    }

    /// Raw index.
    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    /// True for the reserved restart id.
    #[inline]
    pub fn is_restart(self) -> bool {
        self == Self::RESTART
    }

    /// Bit of this channel in a registration mask.
    #[inline]
    pub(crate) fn bit(self) -> u32 {
        1u32 << self.index()
    }

    /// Topic suffix published for this channel: its decimal index.
    pub fn topic_suffix(self) -> String {
        self.index().to_string()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_restart() {
            f.write_str("restart")
        } else {
            write!(f, "ch{}", self.index())
        }
    }
}
