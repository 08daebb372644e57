//! # Input collaborator contract.

use crate::channel::ChannelId;
use crate::edge::EdgeIsr;
use crate::error::EdgeError;

/// Hardware inputs that raise edge interrupts.
///
/// Implementations configure the pin (pull, polarity) themselves; the pipeline
/// only needs "an edge-triggered source that yields a channel id".
///
/// # Example
/// ```
/// use pressvisor::{ChannelId, EdgeError, EdgeIsr, InputPins};
///
/// struct NoPins;
///
/// impl InputPins for NoPins {
///     fn register_edge_source(&self, _: ChannelId, _: EdgeIsr) -> Result<(), EdgeError> {
///         Ok(())
///     }
///     fn deregister_edge_source(&self, _: ChannelId) -> Result<(), EdgeError> {
///         Ok(())
///     }
///     fn read_level(&self, _: ChannelId) -> bool {
///         false
///     }
/// }
/// ```
pub trait InputPins: Send + Sync + 'static {
    /// Installs `isr` as the rising-edge handler of `channel`.
    ///
    /// `isr.fire()` is safe to call from interrupt context.
    fn register_edge_source(&self, channel: ChannelId, isr: EdgeIsr) -> Result<(), EdgeError>;

    /// Removes the handler of `channel`.
    fn deregister_edge_source(&self, channel: ChannelId) -> Result<(), EdgeError>;

    /// Instantaneous digital level of `channel` (`true` = active).
    fn read_level(&self, channel: ChannelId) -> bool;
}
